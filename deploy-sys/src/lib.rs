// SPDX-License-Identifier: GPL-3.0-only

//! Low-level process execution for deployment tooling
//!
//! Every external tool the partitioner drives (parted, fuser) goes through
//! the `CommandExecutor` trait defined here. `SystemExecutor` is the real
//! implementation; callers substitute their own executor in tests so that
//! no process is ever launched.

pub mod error;
pub mod exec;

pub use error::{Result, SysError};
pub use exec::{CommandExecutor, ExecOptions, ExecOutput, SystemExecutor, render};
