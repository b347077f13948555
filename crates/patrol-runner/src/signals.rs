//! Bridges POSIX signals onto the scheduler queue.
//!
//! The supervising process requests a graceful stop with `SIGUSR1`; `SIGINT`
//! receives the same treatment so interactive runs wind down cleanly. The
//! listener thread only posts onto the scheduler queue, so no session logic
//! ever executes in signal context.

use std::io;
use std::thread;

use signal_hook::consts::signal::{SIGINT, SIGUSR1};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use patrol_plugins::SchedulerHandle;

/// Tracing target for the signal bridge.
const SIGNALS_TARGET: &str = "patrol_runner::signals";

/// Errors reported while installing the signal listener.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Spawning the listener thread failed.
    #[error("failed to spawn signal listener thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Spawns the listener thread that turns signals into stop requests.
///
/// Every `SIGUSR1` or `SIGINT` posts one stop task; the plugin decides when
/// the session actually ends, so repeated signals are harmless.
///
/// # Errors
///
/// Returns [`SignalError`] when the handlers cannot be registered or the
/// listener thread cannot be spawned.
pub fn install(scheduler: SchedulerHandle) -> Result<(), SignalError> {
    let mut signals =
        Signals::new([SIGUSR1, SIGINT]).map_err(|source| SignalError::Install { source })?;
    thread::Builder::new()
        .name(String::from("patrol-signals"))
        .spawn(move || {
            for signal in signals.forever() {
                info!(target: SIGNALS_TARGET, signal, "stop signal received");
                scheduler.request_stop();
            }
        })
        .map_err(|source| SignalError::Spawn { source })?;
    Ok(())
}
