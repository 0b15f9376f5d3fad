// SPDX-License-Identifier: GPL-3.0-only

//! `parted` script generation
//!
//! The layout is rendered as one `parted --script` invocation: a fresh label,
//! one `mkpart` per partition, then the boot flags. Flags come last because
//! `set` needs the target partition to exist already.

use deploy_types::{Alignment, DiskLabel, PartitionKind, SizeUnit};
use serde::Serialize;

use crate::PartitionTable;

/// A single `parted` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PartedOp {
    MkLabel {
        label: DiskLabel,
    },
    MkPart {
        kind: PartitionKind,
        fs_type: String,
        start: u64,
        end: u64,
    },
    SetFlag {
        number: u32,
        flag: String,
        enabled: bool,
    },
}

impl PartedOp {
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::MkLabel { label } => vec!["mklabel".to_string(), label.to_string()],
            Self::MkPart {
                kind,
                fs_type,
                start,
                end,
            } => {
                let mut tokens = vec!["mkpart".to_string(), kind.to_string()];
                // parted treats the filesystem type as optional
                if !fs_type.is_empty() {
                    tokens.push(fs_type.clone());
                }
                tokens.push(start.to_string());
                tokens.push(end.to_string());
                tokens
            }
            Self::SetFlag {
                number,
                flag,
                enabled,
            } => vec![
                "set".to_string(),
                number.to_string(),
                flag.clone(),
                if *enabled { "on" } else { "off" }.to_string(),
            ],
        }
    }
}

/// Build the ordered command list for a table.
///
/// Boundaries are cumulative in `unit`: partition `n` starts where `n - 1`
/// ended, and the first one starts after a 1 MiB lead-in for the label.
pub fn build_ops(table: &PartitionTable, unit: SizeUnit) -> Vec<PartedOp> {
    let mut ops = Vec::with_capacity(1 + table.len() * 2);
    ops.push(PartedOp::MkLabel {
        label: table.label(),
    });

    let mut start = unit.lead_in();
    for (_, spec) in table.partitions() {
        let end = start + spec.size;
        ops.push(PartedOp::MkPart {
            kind: spec.kind,
            fs_type: spec.fs_type.clone(),
            start,
            end,
        });
        start = end;
    }

    ops.extend(
        table
            .partitions()
            .filter(|(_, spec)| spec.bootable)
            .map(|(number, _)| PartedOp::SetFlag {
                number,
                flag: "boot".to_string(),
                enabled: true,
            }),
    );

    ops
}

pub fn script_tokens(ops: &[PartedOp]) -> Vec<String> {
    ops.iter().flat_map(PartedOp::tokens).collect()
}

/// Fully resolved backend call for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartedInvocation {
    pub program: String,
    pub device: String,
    pub alignment: Alignment,
    pub unit: SizeUnit,
    pub ops: Vec<PartedOp>,
}

impl PartedInvocation {
    pub fn new(program: impl Into<String>, table: &PartitionTable, unit: SizeUnit) -> Self {
        Self {
            program: program.into(),
            device: table.device().to_string(),
            alignment: table.alignment(),
            unit,
            ops: build_ops(table, unit),
        }
    }

    /// The command tokens handed to parted after the `unit` prefix
    pub fn script(&self) -> Vec<String> {
        script_tokens(&self.ops)
    }

    /// Complete argument vector, e.g.
    /// `-a optimal -s /dev/sda -- unit MiB mklabel msdos ...`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-a".to_string(),
            self.alignment.as_parted_str().to_string(),
            "-s".to_string(),
            self.device.clone(),
            "--".to_string(),
            "unit".to_string(),
            self.unit.as_parted_str().to_string(),
        ];
        args.extend(self.script());
        args
    }

    pub fn render(&self) -> String {
        deploy_sys::render(&self.program, &self.args())
    }
}

#[cfg(test)]
mod tests {
    use deploy_types::PartitionOptions;

    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn two_partition_table() -> PartitionTable {
        let mut table = PartitionTable::new("/dev/fake");
        let options = PartitionOptions::default()
            .kind(PartitionKind::Logical)
            .fs_type("fake-fs-type");
        table.add_partition_with(1, options.clone()).unwrap();
        table
            .add_partition_with(1, options.bootable(true))
            .unwrap();
        table
    }

    #[test]
    fn renders_label_parts_then_flags() {
        let ops = build_ops(&two_partition_table(), SizeUnit::MiB);
        assert_eq!(
            script_tokens(&ops),
            tokens(&[
                "mklabel",
                "msdos",
                "mkpart",
                "logical",
                "fake-fs-type",
                "1",
                "2",
                "mkpart",
                "logical",
                "fake-fs-type",
                "2",
                "3",
                "set",
                "2",
                "boot",
                "on",
            ])
        );
    }

    #[test]
    fn boundaries_accumulate_sizes() {
        let mut table = PartitionTable::new("/dev/sda");
        table.add_partition(512).unwrap();
        table.add_partition(1024).unwrap();
        table.add_partition(4096).unwrap();

        let bounds: Vec<(u64, u64)> = build_ops(&table, SizeUnit::MiB)
            .into_iter()
            .filter_map(|op| match op {
                PartedOp::MkPart { start, end, .. } => Some((start, end)),
                _ => None,
            })
            .collect();
        assert_eq!(bounds, vec![(1, 513), (513, 1537), (1537, 5633)]);
    }

    #[test]
    fn sector_unit_starts_after_one_mebibyte() {
        let mut table = PartitionTable::new("/dev/sda").with_label(DiskLabel::Gpt);
        table.add_partition(2048).unwrap();
        table.add_partition(4096).unwrap();

        let invocation = PartedInvocation::new("parted", &table, SizeUnit::Sector);
        assert_eq!(
            invocation.render(),
            "parted -a optimal -s /dev/sda -- unit s mklabel gpt \
             mkpart primary 2048 4096 mkpart primary 4096 8192"
        );
    }

    #[test]
    fn mebibyte_unit_starts_at_one() {
        let mut table = PartitionTable::new("/dev/sda").with_label(DiskLabel::Gpt);
        table.add_partition(2048).unwrap();

        let invocation = PartedInvocation::new("parted", &table, SizeUnit::MiB);
        assert_eq!(
            invocation.render(),
            "parted -a optimal -s /dev/sda -- unit MiB mklabel gpt mkpart primary 1 2049"
        );
    }

    #[test]
    fn boot_flags_follow_table_order_after_all_parts() {
        let mut table = PartitionTable::new("/dev/sda");
        table
            .add_partition_with(1, PartitionOptions::default().bootable(true))
            .unwrap();
        table.add_partition(1).unwrap();
        table
            .add_partition_with(1, PartitionOptions::default().bootable(true))
            .unwrap();

        let ops = build_ops(&table, SizeUnit::MiB);
        assert!(matches!(ops[0], PartedOp::MkLabel { .. }));
        assert!(
            ops[1..4]
                .iter()
                .all(|op| matches!(op, PartedOp::MkPart { .. }))
        );
        let flagged: Vec<u32> = ops[4..]
            .iter()
            .filter_map(|op| match op {
                PartedOp::SetFlag { number, .. } => Some(*number),
                _ => None,
            })
            .collect();
        assert_eq!(flagged, vec![1, 3]);
        assert_eq!(ops.len(), 6);
    }

    #[test]
    fn empty_fs_type_is_omitted() {
        let mut table = PartitionTable::new("/dev/sda");
        table.add_partition(100).unwrap();
        assert_eq!(
            script_tokens(&build_ops(&table, SizeUnit::MiB)),
            tokens(&["mklabel", "msdos", "mkpart", "primary", "1", "101"])
        );
    }

    #[test]
    fn empty_table_only_writes_label() {
        let table = PartitionTable::new("/dev/sda").with_label(DiskLabel::Gpt);
        assert_eq!(
            script_tokens(&build_ops(&table, SizeUnit::MiB)),
            tokens(&["mklabel", "gpt"])
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let table = two_partition_table();
        assert_eq!(build_ops(&table, SizeUnit::MiB), build_ops(&table, SizeUnit::MiB));
    }

    #[test]
    fn invocation_prefixes_device_and_unit() {
        let invocation = PartedInvocation::new("parted", &two_partition_table(), SizeUnit::MiB);
        let args = invocation.args();
        assert_eq!(
            args[..7].to_vec(),
            tokens(&["-a", "optimal", "-s", "/dev/fake", "--", "unit", "MiB"])
        );
        assert_eq!(args[7..].to_vec(), invocation.script());
        assert!(
            invocation
                .render()
                .starts_with("parted -a optimal -s /dev/fake -- unit MiB mklabel msdos")
        );
    }
}
