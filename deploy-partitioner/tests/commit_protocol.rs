// SPDX-License-Identifier: GPL-3.0-only

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use deploy_partitioner::{
    CommitOutcome, CommitSettings, DeployFailure, PartitionCommitter, PartitionError,
    PartitionTable, Sleeper,
};
use deploy_sys::{CommandExecutor, ExecOptions, ExecOutput, SysError};
use deploy_types::{PartitionKind, PartitionOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    program: String,
    args: Vec<String>,
    options: ExecOptions,
}

/// Records every call; parted always succeeds, fuser replays a script and
/// repeats the last response once the script runs out.
#[derive(Default)]
struct FakeHost {
    calls: RefCell<Vec<Call>>,
    fuser: RefCell<VecDeque<(String, String)>>,
    last_fuser: RefCell<(String, String)>,
    parted_error: RefCell<Option<SysError>>,
}

impl FakeHost {
    fn with_fuser(outputs: &[(&str, &str)]) -> Self {
        let host = Self::default();
        host.fuser.borrow_mut().extend(
            outputs
                .iter()
                .map(|(out, err)| (out.to_string(), err.to_string())),
        );
        host
    }

    fn calls_to(&self, program: &str) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.program == program)
            .cloned()
            .collect()
    }
}

impl CommandExecutor for FakeHost {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> deploy_sys::Result<ExecOutput> {
        self.calls.borrow_mut().push(Call {
            program: program.to_string(),
            args: args.to_vec(),
            options: options.clone(),
        });

        if program == "parted" {
            if let Some(error) = self.parted_error.borrow_mut().take() {
                return Err(error);
            }
            return Ok(ExecOutput::default());
        }

        let next = self.fuser.borrow_mut().pop_front();
        let (stdout, stderr) = match next {
            Some(output) => {
                *self.last_fuser.borrow_mut() = output.clone();
                output
            }
            None => self.last_fuser.borrow().clone(),
        };
        Ok(ExecOutput {
            exit_code: if stdout.is_empty() { 1 } else { 0 },
            stdout,
            stderr,
        })
    }
}

#[derive(Default)]
struct RecordingSleeper {
    pauses: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn fake_table() -> PartitionTable {
    let mut table = PartitionTable::new("/dev/fake");
    let options = PartitionOptions::default()
        .kind(PartitionKind::Primary)
        .fs_type("fake-fs-type");
    table.add_partition_with(1, options.clone()).unwrap();
    table
        .add_partition_with(1, options.bootable(true))
        .unwrap();
    table
}

fn expected_parted_args() -> Vec<String> {
    strings(&[
        "-a",
        "optimal",
        "-s",
        "/dev/fake",
        "--",
        "unit",
        "MiB",
        "mklabel",
        "msdos",
        "mkpart",
        "primary",
        "fake-fs-type",
        "1",
        "2",
        "mkpart",
        "primary",
        "fake-fs-type",
        "2",
        "3",
        "set",
        "2",
        "boot",
        "on",
    ])
}

fn assert_parted_called_once(host: &FakeHost) {
    let parted = host.calls_to("parted");
    assert_eq!(parted.len(), 1);
    assert_eq!(parted[0].args, expected_parted_args());
    assert!(parted[0].options.run_as_root);
}

fn assert_fuser_calls(host: &FakeHost, expected: usize) {
    let fuser = host.calls_to("fuser");
    assert_eq!(fuser.len(), expected);
    for call in &fuser {
        assert_eq!(call.args, strings(&["/dev/fake"]));
        assert!(call.options.run_as_root);
        assert_eq!(call.options.check_exit_codes, vec![0, 1]);
    }
}

#[test]
fn clean_commit_checks_device_once() {
    let host = FakeHost::with_fuser(&[("", "")]);
    let sleeper = RecordingSleeper::default();
    let committer = PartitionCommitter::new(&host).with_sleeper(&sleeper);

    committer.commit(fake_table()).expect("commit succeeds");

    assert_parted_called_once(&host);
    assert_fuser_calls(&host, 1);
    assert!(sleeper.pauses.borrow().is_empty());
    // parted runs before the first busy check
    assert_eq!(host.calls.borrow()[0].program, "parted");
}

#[test]
fn transient_busy_device_is_retried() {
    let host = FakeHost::with_fuser(&[("/dev/fake: 10000 10001", ""), ("", "")]);
    let sleeper = RecordingSleeper::default();
    let committer = PartitionCommitter::new(&host).with_sleeper(&sleeper);

    committer.commit(fake_table()).expect("commit succeeds");

    assert_parted_called_once(&host);
    assert_fuser_calls(&host, 2);
    assert_eq!(*sleeper.pauses.borrow(), vec![Duration::from_secs(1)]);
}

#[test]
fn permanently_busy_device_times_out_after_twenty_checks() {
    let host = FakeHost::with_fuser(&[("/dev/fake: 10000 10001", "")]);
    let sleeper = RecordingSleeper::default();
    let committer = PartitionCommitter::new(&host).with_sleeper(&sleeper);

    let error = committer.commit(fake_table()).unwrap_err();

    assert_eq!(error.outcome(), Some(CommitOutcome::BusyTimeout));
    match error {
        PartitionError::DeployFailed {
            device,
            reason: DeployFailure::BusyTimeout {
                attempts, holders, ..
            },
        } => {
            assert_eq!(device, "/dev/fake");
            assert_eq!(attempts, 20);
            assert_eq!(holders, "/dev/fake: 10000 10001");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_parted_called_once(&host);
    assert_fuser_calls(&host, 20);
    assert_eq!(sleeper.pauses.borrow().len(), 19);
}

#[test]
fn disconnected_device_fails_without_retrying() {
    let host = FakeHost::with_fuser(&[("", "Specified filename /dev/fake does not exist.")]);
    let sleeper = RecordingSleeper::default();
    let committer = PartitionCommitter::new(&host).with_sleeper(&sleeper);

    let error = committer.commit(fake_table()).unwrap_err();

    assert_eq!(error.outcome(), Some(CommitOutcome::DeviceGone));
    assert!(matches!(
        error,
        PartitionError::DeployFailed {
            reason: DeployFailure::DeviceGone { .. },
            ..
        }
    ));
    assert_parted_called_once(&host);
    assert_fuser_calls(&host, 1);
    assert!(sleeper.pauses.borrow().is_empty());
}

#[test]
fn backend_failure_is_fatal_and_skips_busy_checks() {
    let host = FakeHost::default();
    *host.parted_error.borrow_mut() = Some(SysError::UnexpectedExitCode {
        command: "parted".to_string(),
        code: 1,
        stdout: String::new(),
        stderr: "Error: Partition(s) on /dev/fake are being used.".to_string(),
    });
    let committer = PartitionCommitter::new(&host).with_sleeper(RecordingSleeper::default());

    let error = committer.commit(fake_table()).unwrap_err();

    assert!(matches!(error, PartitionError::Backend { .. }));
    assert_eq!(error.outcome(), None);
    assert_fuser_calls(&host, 0);
}

fn partition_and_commit<E, S>(
    committer: &PartitionCommitter<E, S>,
    sizes: &[u64],
) -> Result<(), PartitionError>
where
    E: CommandExecutor,
    S: Sleeper,
{
    let mut table = PartitionTable::new("/dev/fake");
    for size in sizes {
        table.add_partition(*size)?;
    }
    committer.commit(table)
}

#[test]
fn invalid_size_fails_before_any_process_runs() {
    let host = FakeHost::with_fuser(&[("", "")]);
    let sleeper = RecordingSleeper::default();
    let committer = PartitionCommitter::new(&host).with_sleeper(&sleeper);

    let result = partition_and_commit(&committer, &[1024, 0, 2048]);

    assert!(matches!(result, Err(PartitionError::InvalidArgument(_))));
    assert!(host.calls.borrow().is_empty());
    assert!(sleeper.pauses.borrow().is_empty());

    // the same committer still works once the layout is valid
    partition_and_commit(&committer, &[1024, 2048]).expect("commit succeeds");
    assert_eq!(host.calls_to("parted").len(), 1);
}

#[test]
fn device_disappearing_after_busy_check_stops_retrying() {
    let host = FakeHost::with_fuser(&[
        ("/dev/fake: 10000", ""),
        ("", "Specified filename /dev/fake does not exist."),
    ]);
    let sleeper = RecordingSleeper::default();
    let committer = PartitionCommitter::new(&host).with_sleeper(&sleeper);

    let error = committer.commit(fake_table()).unwrap_err();

    match error {
        PartitionError::DeployFailed {
            reason: DeployFailure::DeviceGone { stderr },
            ..
        } => assert_eq!(stderr, "Specified filename /dev/fake does not exist."),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_parted_called_once(&host);
    assert_fuser_calls(&host, 2);
    assert_eq!(sleeper.pauses.borrow().len(), 1);
}

#[test]
fn configured_interval_and_budget_are_honoured() {
    let host = FakeHost::with_fuser(&[("1234", "")]);
    let sleeper = RecordingSleeper::default();
    let committer = PartitionCommitter::new(&host)
        .with_sleeper(&sleeper)
        .with_settings(CommitSettings {
            check_interval: Duration::from_millis(250),
            max_attempts: 3,
            ..CommitSettings::default()
        });

    assert!(committer.commit(fake_table()).is_err());
    assert_fuser_calls(&host, 3);
    assert_eq!(
        *sleeper.pauses.borrow(),
        vec![Duration::from_millis(250), Duration::from_millis(250)]
    );
}
