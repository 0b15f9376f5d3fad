// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use deploy_partitioner::layout::Layout;
use deploy_partitioner::{CommitOutcome, Config, PartitionCommitter, logging};

#[derive(Debug, Parser)]
#[command(name = "deploy-partitioner")]
#[command(about = "Write a partition table to a block device and wait for it to settle")]
struct Args {
    /// Layout file describing the device and its partitions.
    ///
    /// An empty or missing `fs_type` is left out of `mkpart`, so parted
    /// creates the partition without a filesystem hint.
    #[arg(long)]
    layout: PathBuf,

    /// Partitioner configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the device named in the layout
    #[arg(long)]
    device: Option<String>,

    /// Print the parted invocation instead of running it
    #[arg(long)]
    dry_run: bool,

    /// With --dry-run, print the plan as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}


fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    for _ in 0..args.verbose {
        config.logging.level = config.logging.level.raised();
    }
    let _log_guard = logging::init(&config.logging);

    let mut layout = Layout::load(&args.layout)?;
    if let Some(device) = args.device {
        layout.device = device;
    }
    let table = layout
        .to_table(&config)
        .with_context(|| format!("invalid layout in {}", args.layout.display()))?;

    let committer =
        PartitionCommitter::new(config.executor()).with_settings(config.commit_settings());

    if args.dry_run {
        let plan = committer.plan(&table);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            println!("{}", plan.render());
        }
        return Ok(());
    }

    if unsafe { libc::geteuid() } != 0 && config.exec.root_helper.is_empty() {
        tracing::error!("Partitioning requires root privileges or a root helper");
        anyhow::bail!("must run as root, or configure exec.root_helper");
    }

    let device = table.device().to_string();
    tracing::info!(
        "Starting deploy-partitioner v{} for {}",
        env!("CARGO_PKG_VERSION"),
        device
    );

    let result = committer.commit(table);
    if let Some(outcome) = CommitOutcome::of(&result) {
        tracing::info!(?outcome, "Commit finished");
    }
    result.with_context(|| format!("failed to partition {device}"))?;

    println!("{device}: partition table written");
    Ok(())
}
