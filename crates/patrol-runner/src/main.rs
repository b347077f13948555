//! Process entrypoint for the Patrol plugin runner.
//!
//! The binary delegates to [`patrol_runner::run`], which parses arguments,
//! bootstraps the session, and drives the selected plugin to completion.

use std::process::ExitCode;

fn main() -> ExitCode {
    patrol_runner::run(std::env::args_os())
}
