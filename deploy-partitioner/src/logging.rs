// SPDX-License-Identifier: GPL-3.0-only

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LoggingConfig, LoggingLevel};

const LOG_FILE_PREFIX: &str = "deploy-partitioner.log";
const OUR_CRATES: [&str; 3] = ["deploy_partitioner", "deploy_sys", "deploy_contracts"];

/// Filter used when `RUST_LOG` is not set: our crates at `level`, the rest at warn.
pub fn default_directives(level: LoggingLevel) -> String {
    let mut directives: Vec<String> = OUR_CRATES
        .iter()
        .map(|krate| format!("{krate}={}", level.as_directive()))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Install the global subscriber.
///
/// Logs go to stderr, and additionally to a daily-rotated file when
/// `config.directory` is set. The returned guard flushes the file writer and
/// must be kept alive for the lifetime of the process.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.level)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let Some(dir) = config.directory.as_ref() else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return None;
    };

    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!(
            "deploy-partitioner: failed to create log directory {}: {e}",
            dir.display()
        );
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Some(guard)
}
