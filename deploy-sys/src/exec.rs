// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;
use std::sync::Arc;

use crate::{Result, SysError};

/// How a command should be run and which exit codes count as success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    pub run_as_root: bool,
    pub check_exit_codes: Vec<i32>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            run_as_root: false,
            check_exit_codes: vec![0],
        }
    }
}

impl ExecOptions {
    pub fn as_root(mut self) -> Self {
        self.run_as_root = true;
        self
    }

    pub fn allow_exit_codes(mut self, codes: &[i32]) -> Self {
        self.check_exit_codes = codes.to_vec();
        self
    }

    pub fn accepts(&self, code: i32) -> bool {
        self.check_exit_codes.contains(&code)
    }
}

/// Captured result of a command whose exit code was accepted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    /// Neither stream carried any non-whitespace text
    pub fn is_silent(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

/// Runs an external program and captures its output.
///
/// Implementations must return `SysError::UnexpectedExitCode` when the exit
/// code is not listed in `options.check_exit_codes`.
pub trait CommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecOutput>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecOutput> {
        (**self).execute(program, args, options)
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for Arc<E> {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecOutput> {
        (**self).execute(program, args, options)
    }
}

pub fn render(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}

/// Executes commands on the host with `std::process::Command`.
///
/// Privileged commands are prefixed with the configured root helper (for
/// example `sudo`) unless the current process already runs as root.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    root_helper: Vec<String>,
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self {
            root_helper: vec!["sudo".to_string()],
        }
    }
}

impl SystemExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_helper(root_helper: Vec<String>) -> Self {
        Self { root_helper }
    }

    fn build_argv(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
        euid: u32,
    ) -> (String, Vec<String>) {
        if !options.run_as_root || euid == 0 || self.root_helper.is_empty() {
            return (program.to_string(), args.to_vec());
        }

        let mut argv = self.root_helper[1..].to_vec();
        argv.push(program.to_string());
        argv.extend_from_slice(args);
        (self.root_helper[0].clone(), argv)
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecOutput> {
        let euid = unsafe { libc::geteuid() };
        let (launcher, argv) = self.build_argv(program, args, options, euid);
        let rendered = render(&launcher, &argv);

        if which::which(&launcher).is_err() {
            return Err(SysError::ToolNotFound { program: launcher });
        }

        tracing::debug!(command = %rendered, run_as_root = options.run_as_root, "Executing command");

        let output = Command::new(&launcher).args(&argv).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let Some(code) = output.status.code() else {
            return Err(SysError::Terminated { command: rendered });
        };

        if !options.accepts(code) {
            tracing::debug!(command = %rendered, code, "Command exit code not accepted");
            return Err(SysError::UnexpectedExitCode {
                command: rendered,
                code,
                stdout,
                stderr,
            });
        }

        Ok(ExecOutput {
            stdout,
            stderr,
            exit_code: code,
        })
    }
}
