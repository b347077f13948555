//! Integration tests for the `patrol-runner` binary entry point.
//!
//! Exercises the stdout protocol stream, bootstrap failure reporting, and
//! the exit-code policy end to end.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::tempdir;

#[test]
fn hello_plugin_streams_the_session_protocol() {
    let work_root = tempdir().expect("tempdir");
    let mut command = cargo_bin_cmd!("patrol-runner");
    command.args(["--plugin", "hello", "--session", "it-hello"]);
    command.arg("--work-root").arg(work_root.path());
    command
        .assert()
        .success()
        .stdout(
            contains("{\"msg\":\"start\"}\n")
                .and(contains(
                    "{\"msg\":\"progress\",\"data\":{\"percentage\":100,\"description\":\"hello world\"}}\n",
                ))
                .and(contains("\"msg\":\"issue\""))
                .and(contains("\"Summary\":\"Hello world scan completed\""))
                .and(contains(
                    "{\"msg\":\"finish\",\"data\":{\"state\":\"FINISHED\",\"failure\":\"\"}}\n",
                )),
        );
}

#[test]
fn start_line_comes_first_and_finish_last() {
    let work_root = tempdir().expect("tempdir");
    let mut command = cargo_bin_cmd!("patrol-runner");
    command.args(["-p", "hello", "-s", "it-order"]);
    command.arg("--work-root").arg(work_root.path());
    let output = command.output().expect("run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.first(), Some(&"{\"msg\":\"start\"}"));
    assert_eq!(
        lines.last(),
        Some(&"{\"msg\":\"finish\",\"data\":{\"state\":\"FINISHED\",\"failure\":\"\"}}")
    );
}

#[test]
fn unknown_plugin_exits_nonzero_without_events() {
    let mut command = cargo_bin_cmd!("patrol-runner");
    command.args(["--plugin", "no-such-plugin"]);
    command
        .assert()
        .failure()
        .stdout(predicates::str::is_empty());
}

#[test]
fn missing_plugin_argument_is_a_usage_error() {
    let mut command = cargo_bin_cmd!("patrol-runner");
    command.assert().failure();
}

#[test]
fn inline_and_file_configuration_are_mutually_exclusive() {
    let mut command = cargo_bin_cmd!("patrol-runner");
    command.args([
        "--plugin",
        "hello",
        "--configuration",
        "{}",
        "--configuration-file",
        "scan.json",
    ]);
    command.assert().failure();
}

#[test]
fn malformed_inline_configuration_exits_nonzero() {
    let mut command = cargo_bin_cmd!("patrol-runner");
    command.args(["--plugin", "hello", "--configuration", "not json"]);
    command
        .assert()
        .failure()
        .stdout(predicates::str::is_empty());
}

#[test]
fn unreachable_report_directory_reports_a_failed_finish() {
    let work_root = tempdir().expect("tempdir");
    let nested = work_root.path().join("absent").join("reports");
    let configuration = format!(r#"{{"report_dir": "{}"}}"#, nested.display());

    let mut command = cargo_bin_cmd!("patrol-runner");
    command.args(["--plugin", "hello", "--configuration", &configuration]);
    command.arg("--work-root").arg(work_root.path());
    command.assert().failure().stdout(
        contains("\"state\":\"FAILED\"")
            .and(contains("\"message\":\"Failed to create report directory\"")),
    );
}

#[cfg(unix)]
mod signals {
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::Duration;

    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    use tempfile::tempdir;

    #[test]
    fn sigusr1_stops_a_running_scan() {
        let work_root = tempdir().expect("tempdir");
        let mut child = Command::new(env!("CARGO_BIN_EXE_patrol-runner"))
            .args(["--plugin", "sleep", "--configuration", r#"{"duration": 30}"#])
            .arg("--work-root")
            .arg(work_root.path())
            .stdout(Stdio::piped())
            .spawn()
            .expect("spawn runner");

        // Give the scan worker time to start polling before signalling.
        thread::sleep(Duration::from_millis(300));
        let pid = Pid::from_raw(i32::try_from(child.id()).expect("pid fits"));
        kill(pid, Signal::SIGUSR1).expect("send SIGUSR1");

        let output = child.wait_with_output().expect("wait for runner");
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
        assert!(
            stdout.contains("{\"msg\":\"finish\",\"data\":{\"state\":\"STOPPED\",\"failure\":\"\"}}"),
            "expected STOPPED finish, got: {stdout}"
        );
    }
}
