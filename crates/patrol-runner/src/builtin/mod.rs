//! Built-in scan plugins shipped with the runner binary.
//!
//! These are deliberately small: `hello` exercises the full reporting path,
//! `sleep` gives supervisors something long-running to stop, and `command`
//! wraps an arbitrary external program through the process adapter. Real
//! scan plugins register through the same [`PluginRegistry`] surface.

use std::process::{Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use patrol_plugins::blocking::{BlockingScan, ScanEnv, ScanOutcome};
use patrol_plugins::external::{ExternalScan, ProcessHandler};
use patrol_plugins::{Fault, PluginError, PluginRegistry, issue};

/// Poll interval for the sleep plugin's stop checks.
const SLEEP_POLL: Duration = Duration::from_millis(50);

/// Builds the registry of built-in plugins.
///
/// # Errors
///
/// Returns [`PluginError::AlreadyRegistered`] if a name collides, which
/// would be a programming error in this function.
pub fn registry() -> Result<PluginRegistry, PluginError> {
    let mut registry = PluginRegistry::new();
    registry.register("hello", || Ok(Box::new(BlockingScan::new(hello_body))))?;
    registry.register("sleep", || Ok(Box::new(BlockingScan::new(sleep_body))))?;
    registry.register("command", || {
        Ok(Box::new(ExternalScan::new(CommandHandler::default())))
    })?;
    Ok(registry)
}

/// Reports one informational issue and completes immediately.
fn hello_body(env: &ScanEnv) -> ScanOutcome {
    env.sink().report_progress(100, "hello world")?;
    let mut issues = [json!({
        "Summary": "Hello world scan completed",
        "Severity": "Info",
    })];
    issue::assign_ids(&mut issues);
    env.sink().report_issues(&issues)?;
    Ok(None)
}

/// Sleeps for the configured number of seconds, polling for stop requests.
///
/// The `duration` configuration key (seconds, default 1) bounds the nap; a
/// raised stop flag ends it early and the session finishes as stopped.
fn sleep_body(env: &ScanEnv) -> ScanOutcome {
    let seconds = env
        .configuration()
        .get("duration")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        if env.stop().is_raised() {
            return Ok(None);
        }
        thread::sleep(SLEEP_POLL);
    }
    env.sink().report_progress(100, "slept")?;
    Ok(None)
}

/// Runs the program named by the `path` configuration key and reports its
/// captured output as a single issue.
///
/// Optional `arguments` (array of strings) are passed through verbatim. The
/// issue severity follows the exit status: `Info` for success, `Error`
/// otherwise.
#[derive(Debug, Default)]
struct CommandHandler {
    output: Vec<u8>,
}

impl ProcessHandler for CommandHandler {
    fn command(&mut self, env: &ScanEnv) -> Result<Command, Fault> {
        let configuration = env.configuration();
        let path = configuration
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Fault::from("the `path` configuration key is required"))?;
        let mut command = Command::new(path);
        if let Some(arguments) = configuration.get("arguments").and_then(Value::as_array) {
            for argument in arguments {
                let text = argument
                    .as_str()
                    .ok_or_else(|| Fault::from("`arguments` entries must be strings"))?;
                command.arg(text);
            }
        }
        Ok(command)
    }

    fn stdout_chunk(&mut self, _env: &ScanEnv, data: &[u8]) -> Result<(), Fault> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn process_ended(&mut self, env: &ScanEnv, status: ExitStatus) -> Result<(), Fault> {
        let severity = if status.success() { "Info" } else { "Error" };
        let mut issues = [json!({
            "Summary": format!("Command exited with {status}"),
            "Severity": severity,
            "Output": String::from_utf8_lossy(&self.output),
        })];
        issue::assign_ids(&mut issues);
        env.sink().report_issues(&issues)?;
        Ok(())
    }
}
