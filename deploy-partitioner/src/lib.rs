// SPDX-License-Identifier: GPL-3.0-only

//! Partition table builder and commit engine
//!
//! A `PartitionTable` collects the layout for one device. A
//! `PartitionCommitter` turns it into a single `parted` invocation, runs it,
//! then polls the device with `fuser` until nothing holds it open. The device
//! may stay busy for a short while after partitioning (udev and the kernel
//! re-read the new table), so the committer retries a bounded number of
//! times before failing the deployment.

pub mod commit;
pub mod config;
pub mod error;
pub mod layout;
pub mod logging;
pub mod parted;
pub mod probe;
pub mod table;
pub mod vendor;

pub use commit::{CommitSettings, PartitionCommitter, Sleeper, ThreadSleeper};
pub use config::Config;
pub use error::{CommitOutcome, DeployFailure, PartitionError, Result};
pub use parted::{PartedInvocation, PartedOp};
pub use table::PartitionTable;
pub use vendor::{PARTITION_METHOD, PartitionVendor};
