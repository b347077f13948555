//! Support for plugins that wrap an external scanner process.
//!
//! [`ExternalScan`] is the counterpart to
//! [`BlockingScan`](crate::blocking::BlockingScan) for tools that run as
//! separate programs, nmap-style. `start` spawns the handler's command and a
//! supervisor thread that feeds captured output to the [`ProcessHandler`]
//! hooks; completion is posted back onto the scheduler. `stop` kills the
//! child, after which the session finishes as `STOPPED` rather than
//! `FINISHED`. A fault from any hook finishes the session `FAILED`.

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, warn};

use crate::blocking::ScanEnv;
use crate::event::ExitState;
use crate::plugin::{Fault, PluginContext, ScanPlugin, StopFlag};

/// Tracing target for external scan supervision.
const EXTERNAL_TARGET: &str = "patrol_plugins::external";

/// Read buffer size for the child's stdout.
const CHUNK_SIZE: usize = 4096;

/// Handle to the running child, shared with the stop path so it can kill it.
type SharedChild = Arc<Mutex<Option<Child>>>;

/// Hooks an external-process plugin implements.
///
/// Only [`command`](ProcessHandler::command) is required; the output hooks
/// default to discarding their data, for tools whose results are read from
/// the filesystem instead.
pub trait ProcessHandler: Send + 'static {
    /// Builds the command to spawn. Called once at start.
    ///
    /// # Errors
    ///
    /// A fault here surfaces as a start failure.
    fn command(&mut self, env: &ScanEnv) -> Result<Command, Fault>;

    /// Receives one chunk of the child's stdout, in stream order.
    ///
    /// # Errors
    ///
    /// A fault finishes the session `FAILED`.
    fn stdout_chunk(&mut self, _env: &ScanEnv, _data: &[u8]) -> Result<(), Fault> {
        Ok(())
    }

    /// Receives the child's collected stderr, delivered once before exit
    /// handling and only when non-empty.
    ///
    /// # Errors
    ///
    /// A fault finishes the session `FAILED`.
    fn stderr_output(&mut self, _env: &ScanEnv, _data: &[u8]) -> Result<(), Fault> {
        Ok(())
    }

    /// Called after the child exited, with its status.
    ///
    /// The terminal state is the adapter's decision, not the hook's: report
    /// issues or artifacts here and leave the `finish` to the session.
    ///
    /// # Errors
    ///
    /// A fault finishes the session `FAILED`.
    fn process_ended(&mut self, _env: &ScanEnv, _status: ExitStatus) -> Result<(), Fault> {
        Ok(())
    }
}

/// Adapter running an external scanner under the plugin lifecycle.
pub struct ExternalScan<H> {
    handler: Option<H>,
    stop: StopFlag,
    child: SharedChild,
}

impl<H: ProcessHandler> ExternalScan<H> {
    /// Wraps a process handler.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self {
            handler: Some(handler),
            stop: StopFlag::new(),
            child: Arc::new(Mutex::new(None)),
        }
    }
}

impl<H: ProcessHandler> ScanPlugin for ExternalScan<H> {
    fn configure(&mut self, _ctx: &PluginContext) -> Result<(), Fault> {
        Ok(())
    }

    fn start(&mut self, ctx: &PluginContext) -> Result<(), Fault> {
        let mut handler = self
            .handler
            .take()
            .ok_or_else(|| Fault::from("scan handler already consumed"))?;
        let env = ScanEnv::new(ctx.clone(), self.stop.clone());
        let mut command = handler.command(&env)?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(
            target: EXTERNAL_TARGET,
            program = ?command.get_program(),
            "spawning external scanner"
        );
        let mut child = command.spawn().map_err(|error| -> Fault { Box::new(error) })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Fault::from("child stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Fault::from("child stderr not captured"))?;
        let slot = Arc::clone(&self.child);
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(child);

        let collector = thread::Builder::new()
            .name(String::from("patrol-scan-stderr"))
            .spawn(move || drain(stderr))
            .map_err(|error| -> Fault { Box::new(error) })?;
        thread::Builder::new()
            .name(String::from("patrol-scan"))
            .spawn(move || {
                let outcome = supervise(&mut handler, &env, stdout, collector, &slot);
                if outcome.is_err() {
                    reap_after_fault(&slot);
                }
                complete(&env, outcome);
            })
            .map_err(|error| -> Fault { Box::new(error) })?;
        Ok(())
    }

    fn stop(&mut self, _ctx: &PluginContext) -> Result<(), Fault> {
        self.stop.raise();
        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(child) = slot.as_mut() {
            debug!(target: EXTERNAL_TARGET, "killing external scanner");
            if let Err(error) = child.kill() {
                warn!(target: EXTERNAL_TARGET, error = %error, "failed to kill external scanner");
            }
        }
        Ok(())
    }
}

/// Streams child output through the handler hooks, then reaps the child.
fn supervise<H: ProcessHandler>(
    handler: &mut H,
    env: &ScanEnv,
    mut stdout: ChildStdout,
    collector: thread::JoinHandle<Vec<u8>>,
    child: &SharedChild,
) -> Result<ExitStatus, Fault> {
    let mut buffer = [0_u8; CHUNK_SIZE];
    loop {
        let read = stdout
            .read(&mut buffer)
            .map_err(|error| -> Fault { Box::new(error) })?;
        if read == 0 {
            break;
        }
        let Some(chunk) = buffer.get(..read) else {
            break;
        };
        handler.stdout_chunk(env, chunk)?;
    }
    let collected = collector
        .join()
        .map_err(|_| Fault::from("stderr collector panicked"))?;
    if !collected.is_empty() {
        handler.stderr_output(env, &collected)?;
    }
    let status = wait_for_exit(child)?;
    handler.process_ended(env, status)?;
    Ok(status)
}

/// Takes the child out of the shared slot and waits for it.
///
/// Runs after stdout reached end-of-file, so the child has exited or is
/// about to; the stop path finds an empty slot from here on and kills
/// nothing.
fn wait_for_exit(child: &SharedChild) -> Result<ExitStatus, Fault> {
    let taken = child
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    let mut reaped = taken.ok_or_else(|| Fault::from("child already reaped"))?;
    reaped.wait().map_err(|error| -> Fault { Box::new(error) })
}

/// Kills and reaps a child left behind by a failed hook.
fn reap_after_fault(child: &SharedChild) {
    let taken = child.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(mut leftover) = taken {
        if let Err(error) = leftover.kill() {
            warn!(target: EXTERNAL_TARGET, error = %error, "failed to kill scanner after fault");
        }
        if let Err(error) = leftover.wait() {
            warn!(target: EXTERNAL_TARGET, error = %error, "failed to reap scanner after fault");
        }
    }
}

/// Collects the child's stderr to end-of-file.
fn drain(mut stderr: ChildStderr) -> Vec<u8> {
    let mut collected = Vec::new();
    if let Err(error) = stderr.read_to_end(&mut collected) {
        warn!(target: EXTERNAL_TARGET, error = %error, "failed to read scanner stderr");
    }
    collected
}

/// Posts terminal reporting back onto the scheduler thread.
fn complete(env: &ScanEnv, outcome: Result<ExitStatus, Fault>) {
    let context = env.context().clone();
    let stop = env.stop().clone();
    env.context().scheduler().post(move || match outcome {
        Ok(status) => {
            let state = if stop.is_raised() {
                ExitState::Stopped
            } else {
                ExitState::Finished
            };
            debug!(
                target: EXTERNAL_TARGET,
                %state,
                code = ?status.code(),
                "external scanner exited"
            );
            context.finish(state, None);
        }
        Err(fault) => {
            warn!(target: EXTERNAL_TARGET, error = %fault, "external scan hook failed");
            context.finish(ExitState::Failed, None);
        }
    });
}

/// Finds a program on `PATH`.
///
/// Returns the first directory entry that is an executable file, the usual
/// way scanner binaries are resolved before building a command.
#[must_use]
pub fn locate_program(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
