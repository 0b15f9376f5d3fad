// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::time::Duration;

use deploy_sys::SystemExecutor;
use deploy_types::{Alignment, DiskLabel, SizeUnit};
use serde::{Deserialize, Serialize};

use crate::commit::{CommitSettings, DEFAULT_MAX_ATTEMPTS};
use crate::{PartitionError, PartitionTable, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// One step more verbose, saturating at `Trace`
    pub fn raised(self) -> Self {
        match self {
            Self::Error => Self::Warn,
            Self::Warn => Self::Info,
            Self::Info => Self::Debug,
            Self::Debug | Self::Trace => Self::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskPartitionerConfig {
    /// Milliseconds between busy checks
    pub check_device_interval_ms: u64,
    pub check_device_max_retries: u32,
}

impl Default for DiskPartitionerConfig {
    fn default() -> Self {
        Self {
            check_device_interval_ms: 1000,
            check_device_max_retries: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartedConfig {
    pub program: String,
    pub alignment: Alignment,
    pub disk_label: DiskLabel,
    pub unit: SizeUnit,
}

impl Default for PartedConfig {
    fn default() -> Self {
        Self {
            program: "parted".to_string(),
            alignment: Alignment::default(),
            disk_label: DiskLabel::default(),
            unit: SizeUnit::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Prepended to privileged commands when not running as root
    pub root_helper: Vec<String>,
    pub busy_probe: String,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            root_helper: vec!["sudo".to_string()],
            busy_probe: "fuser".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LoggingLevel,
    /// Also write daily-rotated log files here
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub disk_partitioner: DiskPartitionerConfig,
    pub parted: PartedConfig,
    pub exec: ExecConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| PartitionError::Config {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        let config = Self::from_toml_str(&raw).map_err(|error| match error {
            PartitionError::InvalidArgument(reason) => PartitionError::Config {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)
            .map_err(|error| PartitionError::InvalidArgument(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.disk_partitioner.check_device_max_retries == 0 {
            return Err(PartitionError::InvalidArgument(
                "disk_partitioner.check_device_max_retries must be at least 1".to_string(),
            ));
        }

        if self.parted.program.trim().is_empty() {
            return Err(PartitionError::InvalidArgument(
                "parted.program must not be empty".to_string(),
            ));
        }

        if self.exec.busy_probe.trim().is_empty() {
            return Err(PartitionError::InvalidArgument(
                "exec.busy_probe must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn commit_settings(&self) -> CommitSettings {
        CommitSettings {
            parted_program: self.parted.program.clone(),
            unit: self.parted.unit,
            busy_probe: self.exec.busy_probe.clone(),
            check_interval: Duration::from_millis(
                self.disk_partitioner.check_device_interval_ms,
            ),
            max_attempts: self.disk_partitioner.check_device_max_retries,
        }
    }

    /// Empty table for `device` using the configured label and alignment
    pub fn new_table(&self, device: impl Into<String>) -> PartitionTable {
        PartitionTable::new(device)
            .with_label(self.parted.disk_label)
            .with_alignment(self.parted.alignment)
    }

    pub fn executor(&self) -> SystemExecutor {
        SystemExecutor::with_root_helper(self.exec.root_helper.clone())
    }
}
