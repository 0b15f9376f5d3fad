// SPDX-License-Identifier: GPL-3.0-only

//! On-disk description of a partition layout
//!
//! ```toml
//! device = "/dev/sda"
//! disk_label = "msdos"
//!
//! [[partitions]]
//! size = 1024
//! fs_type = "ext4"
//! bootable = true
//!
//! [[partitions]]
//! size = 512
//! fs_type = "linux-swap"
//! ```
//!
//! `fs_type` may be omitted. An empty value is not passed to `mkpart`.

use std::fs;
use std::path::Path;

use deploy_types::{Alignment, DiskLabel, PartitionKind, PartitionOptions};
use serde::{Deserialize, Serialize};

use crate::{Config, PartitionError, PartitionTable, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionEntry {
    pub size: u64,
    #[serde(rename = "type", default)]
    pub kind: PartitionKind,
    #[serde(default)]
    pub fs_type: String,
    #[serde(default)]
    pub bootable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub device: String,
    /// Overrides `parted.disk_label` from the configuration
    pub disk_label: Option<DiskLabel>,
    /// Overrides `parted.alignment` from the configuration
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub partitions: Vec<PartitionEntry>,
}

impl Layout {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|error| PartitionError::Config {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        toml::from_str(&raw).map_err(|error| PartitionError::Config {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }

    /// Build the table, validating every entry in order.
    pub fn to_table(&self, config: &Config) -> Result<PartitionTable> {
        if self.device.trim().is_empty() {
            return Err(PartitionError::InvalidArgument(
                "layout device must not be empty".to_string(),
            ));
        }

        let mut table = config.new_table(self.device.clone());
        if let Some(label) = self.disk_label {
            table = table.with_label(label);
        }
        if let Some(alignment) = self.alignment {
            table = table.with_alignment(alignment);
        }

        for entry in &self.partitions {
            let options = PartitionOptions::default()
                .kind(entry.kind)
                .fs_type(entry.fs_type.clone())
                .bootable(entry.bootable);
            table.add_partition_with(entry.size, options)?;
        }

        Ok(table)
    }
}
