// SPDX-License-Identifier: GPL-3.0-only

use deploy_types::{Alignment, DiskLabel, PartitionOptions, PartitionSpec, SizeUnit};

use crate::{PartitionError, Result};

/// Ordered, append-only partition layout for one device.
///
/// Partitions are numbered from 1 in the order they are added. There is no
/// way to remove or reorder entries: the whole layout is written in one pass
/// and replaces whatever table the device had before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    device: String,
    label: DiskLabel,
    alignment: Alignment,
    partitions: Vec<PartitionSpec>,
    // sum of all partition sizes
    total_size: u64,
}

impl PartitionTable {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            label: DiskLabel::default(),
            alignment: Alignment::default(),
            partitions: Vec::new(),
            total_size: 0,
        }
    }

    pub fn with_label(mut self, label: DiskLabel) -> Self {
        self.label = label;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn label(&self) -> DiskLabel {
        self.label
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Append a primary, raw, non-bootable partition.
    pub fn add_partition(&mut self, size: u64) -> Result<u32> {
        self.add_partition_with(size, PartitionOptions::default())
    }

    /// Append a partition and return the number it was given.
    pub fn add_partition_with(&mut self, size: u64, options: PartitionOptions) -> Result<u32> {
        if size == 0 {
            return Err(PartitionError::InvalidArgument(format!(
                "partition size must be positive (device {})",
                self.device
            )));
        }

        // the last end boundary must fit after the lead-in of any unit
        let total_size = self
            .total_size
            .checked_add(size)
            .filter(|total| total.checked_add(SizeUnit::MAX_LEAD_IN).is_some())
            .ok_or_else(|| {
                PartitionError::InvalidArgument(format!(
                    "partition layout for {} exceeds the addressable range",
                    self.device
                ))
            })?;

        let number = self.partitions.len() as u32 + 1;
        self.partitions.push(PartitionSpec {
            number,
            size,
            kind: options.kind,
            fs_type: options.fs_type,
            bootable: options.bootable,
        });
        self.total_size = total_size;

        tracing::debug!(device = %self.device, number, size, "Added partition to layout");
        Ok(number)
    }

    /// Partitions as `(number, spec)` pairs, in insertion order.
    pub fn partitions(&self) -> impl Iterator<Item = (u32, &PartitionSpec)> + '_ {
        self.partitions.iter().map(|spec| (spec.number, spec))
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
