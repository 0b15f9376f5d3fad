// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use deploy_sys::SysError;
use thiserror::Error;

/// Logical result of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Success,
    BusyTimeout,
    DeviceGone,
}

impl CommitOutcome {
    /// Classify the result of a commit. Errors raised before the device
    /// was written, or by the backend itself, have no outcome.
    pub fn of(result: &Result<()>) -> Option<Self> {
        match result {
            Ok(()) => Some(Self::Success),
            Err(error) => error.outcome(),
        }
    }
}

/// Why a committed layout could not be handed over for deployment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployFailure {
    #[error("device is still in use after {attempts} checks (holders: {holders})")]
    BusyTimeout {
        attempts: u32,
        /// Last probe stdout, usually the holder PIDs
        holders: String,
        stderr: String,
    },

    #[error("device no longer exists: {stderr}")]
    DeviceGone { stderr: String },
}

impl DeployFailure {
    pub fn outcome(&self) -> CommitOutcome {
        match self {
            Self::BusyTimeout { .. } => CommitOutcome::BusyTimeout,
            Self::DeviceGone { .. } => CommitOutcome::DeviceGone,
        }
    }
}

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("partitioning {device} failed: {source}")]
    Backend {
        device: String,
        #[source]
        source: SysError,
    },

    #[error("busy check for {device} could not run: {source}")]
    Probe {
        device: String,
        #[source]
        source: SysError,
    },

    #[error("deployment failed for {device}: {reason}")]
    DeployFailed {
        device: String,
        reason: DeployFailure,
    },

    #[error("invalid configuration {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl PartitionError {
    /// Failure reason when the error came out of the busy-wait phase
    pub fn outcome(&self) -> Option<CommitOutcome> {
        match self {
            Self::DeployFailed { reason, .. } => Some(reason.outcome()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PartitionError>;
