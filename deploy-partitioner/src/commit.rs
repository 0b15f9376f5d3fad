// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use deploy_sys::{CommandExecutor, ExecOptions, SysError};
use deploy_types::SizeUnit;

use crate::probe::{self, ProbeVerdict};
use crate::{DeployFailure, PartedInvocation, PartitionError, PartitionTable, Result};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Pause between busy checks
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSettings {
    pub parted_program: String,
    pub unit: SizeUnit,
    pub busy_probe: String,
    pub check_interval: Duration,
    pub max_attempts: u32,
}

impl Default for CommitSettings {
    fn default() -> Self {
        Self {
            parted_program: "parted".to_string(),
            unit: SizeUnit::default(),
            busy_probe: "fuser".to_string(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Writes a `PartitionTable` to its device and waits for the device to settle.
///
/// Commits run on the calling thread and block until the layout is applied
/// and no process holds the device, or until the deployment has failed.
/// Concurrent commits against the same device are not coordinated.
#[derive(Debug, Clone)]
pub struct PartitionCommitter<E, S = ThreadSleeper> {
    executor: E,
    sleeper: S,
    settings: CommitSettings,
}

impl<E: CommandExecutor> PartitionCommitter<E, ThreadSleeper> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            sleeper: ThreadSleeper,
            settings: CommitSettings::default(),
        }
    }
}

impl<E: CommandExecutor, S: Sleeper> PartitionCommitter<E, S> {
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> PartitionCommitter<E, T> {
        PartitionCommitter {
            executor: self.executor,
            sleeper,
            settings: self.settings,
        }
    }

    pub fn with_settings(mut self, settings: CommitSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CommitSettings {
        &self.settings
    }

    /// Resolve the backend call for `table` without running anything.
    pub fn plan(&self, table: &PartitionTable) -> PartedInvocation {
        PartedInvocation::new(&self.settings.parted_program, table, self.settings.unit)
    }

    /// Apply `table` to its device, then wait until the device is free.
    ///
    /// Backend failures are returned immediately. A device that stays busy
    /// for `max_attempts` checks, or that disappears, fails the deployment
    /// with `PartitionError::DeployFailed`.
    pub fn commit(&self, table: PartitionTable) -> Result<()> {
        if table.device().trim().is_empty() {
            return Err(PartitionError::InvalidArgument(
                "target device must not be empty".to_string(),
            ));
        }
        if self.settings.max_attempts == 0 {
            return Err(PartitionError::InvalidArgument(
                "busy check attempts must be at least 1".to_string(),
            ));
        }

        let span = tracing::info_span!("commit", device = %table.device());
        let _entered = span.enter();

        let invocation = self.plan(&table);
        self.apply(&invocation)?;
        self.wait_until_free(table.device())?;

        tracing::info!(partitions = table.len(), "Partition table committed");
        Ok(())
    }

    fn apply(&self, invocation: &PartedInvocation) -> Result<()> {
        tracing::info!(command = %invocation.render(), "Writing partition table");

        self.executor
            .execute(
                &invocation.program,
                &invocation.args(),
                &ExecOptions::default().as_root(),
            )
            .map_err(|source| {
                tracing::error!(error = %source, "Partitioning backend failed");
                PartitionError::Backend {
                    device: invocation.device.clone(),
                    source,
                }
            })?;

        Ok(())
    }

    /// Poll the busy probe until the device is free, gone, or the attempt
    /// budget is spent. Sleeps only between attempts.
    pub fn wait_until_free(&self, device: &str) -> Result<()> {
        let max_attempts = self.settings.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match self.probe(device)? {
                ProbeVerdict::Free => {
                    tracing::debug!(attempt, "Device is free");
                    return Ok(());
                }
                ProbeVerdict::Gone { stderr } => DeployFailure::DeviceGone { stderr },
                ProbeVerdict::Busy { holders, stderr } => {
                    if attempt < max_attempts {
                        tracing::warn!(
                            attempt,
                            max_attempts,
                            holders = %holders,
                            "Device is busy, retrying"
                        );
                        self.sleeper.sleep(self.settings.check_interval);
                        continue;
                    }
                    DeployFailure::BusyTimeout {
                        attempts: attempt,
                        holders,
                        stderr,
                    }
                }
            };

            tracing::error!(attempt, reason = %failure, "Device did not become available");
            return Err(PartitionError::DeployFailed {
                device: device.to_string(),
                reason: failure,
            });
        }
    }

    fn probe(&self, device: &str) -> Result<ProbeVerdict> {
        let args = [device.to_string()];
        let output = self
            .executor
            .execute(&self.settings.busy_probe, &args, &probe::probe_options());

        match output {
            Ok(output) => {
                let verdict = probe::classify(&output);
                tracing::debug!(?verdict, "Busy check finished");
                Ok(verdict)
            }
            // An unexpected exit code still carries useful output; keep polling.
            Err(SysError::UnexpectedExitCode {
                command,
                code,
                stdout,
                stderr,
            }) => {
                tracing::warn!(command = %command, code, "Busy check exited abnormally");
                let output = deploy_sys::ExecOutput {
                    stdout,
                    stderr,
                    exit_code: code,
                };
                Ok(match probe::classify(&output) {
                    ProbeVerdict::Free => ProbeVerdict::Busy {
                        holders: String::new(),
                        stderr: format!("{command} exited with code {code}"),
                    },
                    verdict => verdict,
                })
            }
            Err(source) => Err(PartitionError::Probe {
                device: device.to_string(),
                source,
            }),
        }
    }
}
