// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for process execution
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("required tool not found in PATH: {program}")]
    ToolNotFound { program: String },

    #[error("{command} exited with code {code}; stderr: {stderr}")]
    UnexpectedExitCode {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("{command} was terminated by a signal")]
    Terminated { command: String },
}

/// Result type alias for process execution
pub type Result<T> = std::result::Result<T, SysError>;
