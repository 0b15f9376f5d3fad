// SPDX-License-Identifier: GPL-3.0-only

//! Interpretation of `fuser <device>` output
//!
//! `fuser` exits 0 and prints holder PIDs when the device is open, exits 1
//! with no output when it is free, and complains on stderr when the path is
//! missing altogether.

use deploy_sys::{ExecOptions, ExecOutput};

/// Exit codes `fuser` uses for "in use" (0) and "free" (1)
pub const PROBE_EXIT_CODES: [i32; 2] = [0, 1];

const GONE_MARKERS: [&str; 2] = ["does not exist", "no such file or directory"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    Free,
    Busy { holders: String, stderr: String },
    Gone { stderr: String },
}

pub fn probe_options() -> ExecOptions {
    ExecOptions::default()
        .as_root()
        .allow_exit_codes(&PROBE_EXIT_CODES)
}

pub fn classify(output: &ExecOutput) -> ProbeVerdict {
    if output.is_silent() {
        return ProbeVerdict::Free;
    }

    let stderr = output.stderr.trim();
    if reports_missing_device(stderr) {
        return ProbeVerdict::Gone {
            stderr: stderr.to_string(),
        };
    }

    ProbeVerdict::Busy {
        holders: output.stdout.trim().to_string(),
        stderr: stderr.to_string(),
    }
}

fn reports_missing_device(stderr: &str) -> bool {
    let lowered = stderr.to_ascii_lowercase();
    GONE_MARKERS.iter().any(|marker| lowered.contains(marker))
}
