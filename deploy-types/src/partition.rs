// SPDX-License-Identifier: GPL-3.0-only

//! Partition layout requests - flat representation

use std::fmt;

use serde::{Deserialize, Serialize};

/// MBR partition entry kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    #[default]
    Primary,
    Extended,
    Logical,
}

impl PartitionKind {
    /// Token understood by `parted mkpart`
    pub fn as_parted_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Extended => "extended",
            Self::Logical => "logical",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_parted_str())
    }
}

/// Partition table format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskLabel {
    /// Legacy MBR/DOS table
    #[default]
    #[serde(alias = "dos", alias = "mbr")]
    Msdos,

    /// GUID Partition Table
    Gpt,
}

impl DiskLabel {
    pub fn as_parted_str(&self) -> &'static str {
        match self {
            Self::Msdos => "msdos",
            Self::Gpt => "gpt",
        }
    }
}

impl fmt::Display for DiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_parted_str())
    }
}

/// Partition placement policy passed as `parted -a`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    None,
    Cylinder,
    Minimal,
    #[default]
    Optimal,
}

impl Alignment {
    pub fn as_parted_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cylinder => "cylinder",
            Self::Minimal => "minimal",
            Self::Optimal => "optimal",
        }
    }
}

/// Unit in which partition sizes and boundaries are expressed
///
/// Only units that can express the 1 MiB lead-in exactly are offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeUnit {
    #[serde(rename = "MiB")]
    #[default]
    MiB,
    /// 512-byte sectors
    #[serde(rename = "s")]
    Sector,
}

impl SizeUnit {
    /// Largest `lead_in` of any unit
    pub const MAX_LEAD_IN: u64 = 2048;

    pub fn as_parted_str(&self) -> &'static str {
        match self {
            Self::MiB => "MiB",
            Self::Sector => "s",
        }
    }

    /// Start of the first partition: 1 MiB, leaving room for the label
    /// (the GPT header and entries, or the MBR plus bootloader gap).
    pub fn lead_in(&self) -> u64 {
        match self {
            Self::MiB => 1,
            Self::Sector => 2048,
        }
    }
}

/// One requested partition
///
/// `number` is assigned by the owning table (1-based, insertion
/// order) and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// Partition number (1-based)
    pub number: u32,

    /// Size in the table's unit; always non-zero
    pub size: u64,

    #[serde(rename = "type")]
    pub kind: PartitionKind,

    /// Filesystem hint for parted; empty means raw/unspecified
    pub fs_type: String,

    pub bootable: bool,
}

/// Optional attributes for a new partition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionOptions {
    #[serde(rename = "type")]
    pub kind: PartitionKind,
    pub fs_type: String,
    pub bootable: bool,
}

impl PartitionOptions {
    pub fn kind(mut self, kind: PartitionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn fs_type(mut self, fs_type: impl Into<String>) -> Self {
        self.fs_type = fs_type.into();
        self
    }

    pub fn bootable(mut self, bootable: bool) -> Self {
        self.bootable = bootable;
        self
    }
}
