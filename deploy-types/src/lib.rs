// SPDX-License-Identifier: GPL-3.0-only

//! Shared data models for the deployment partitioner
//!
//! These types describe a partition layout independently of the tool that
//! eventually writes it to disk:
//!
//! - `PartitionSpec` → one requested partition
//! - `PartitionKind` → MBR entry kind (primary / extended / logical)
//! - `DiskLabel` → partition table format written by `mklabel`
//! - `Alignment` / `SizeUnit` → backend placement settings

pub mod partition;

pub use partition::*;
