//! The plugin capability set and its runner-provided context.
//!
//! Every scan plugin implements [`ScanPlugin`]: three synchronous lifecycle
//! hooks driven by the runner. Long-running work must not block the hooks;
//! plugins hand it to a worker (see [`crate::blocking`]) and report back
//! through the [`CallbackSink`] and [`SchedulerHandle`] carried by their
//! [`PluginContext`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

use crate::config::Configuration;
use crate::event::{ExitState, FailureReport};
use crate::scheduler::SchedulerHandle;
use crate::sink::CallbackSink;

/// Error type lifecycle hooks fail with.
///
/// The runner never inspects faults beyond rendering them into a
/// [`FailureReport`], so plugins are free to use any error type.
pub type Fault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Capability set every scan plugin implements.
///
/// The runner calls the hooks in order: `configure` once, then `start` once
/// if configuration succeeded, then `stop` zero or more times. Hooks must
/// return promptly; a hook that fails never unwinds past the runner.
pub trait ScanPlugin: Send {
    /// Validates configuration and prepares the plugin for `start`.
    ///
    /// # Errors
    ///
    /// A fault here is reported as `Failed to configure plugin` and
    /// prevents `start` from ever running.
    fn configure(&mut self, ctx: &PluginContext) -> Result<(), Fault>;

    /// Kicks off the scan, typically by spawning asynchronous work.
    ///
    /// # Errors
    ///
    /// A fault here is reported as `Failed to start plugin`.
    fn start(&mut self, ctx: &PluginContext) -> Result<(), Fault>;

    /// Requests a cooperative wind-down of in-flight work.
    ///
    /// # Errors
    ///
    /// Faults are logged and swallowed by the runner; stopping is
    /// best-effort and never crashes the host process.
    fn stop(&mut self, ctx: &PluginContext) -> Result<(), Fault>;
}

/// The context fields the runner binds into a plugin session.
///
/// Cheap to clone; worker threads carry a clone so they can emit events and
/// post completion tasks without touching runner-owned state.
#[derive(Clone)]
pub struct PluginContext {
    scheduler: SchedulerHandle,
    sink: Arc<dyn CallbackSink>,
    work_directory: PathBuf,
    session_id: String,
    configuration: Arc<Configuration>,
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("work_directory", &self.work_directory)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl PluginContext {
    /// Binds the context fields for one session.
    #[must_use]
    pub fn new(
        scheduler: SchedulerHandle,
        sink: Arc<dyn CallbackSink>,
        work_directory: PathBuf,
        session_id: impl Into<String>,
        configuration: Arc<Configuration>,
    ) -> Self {
        Self {
            scheduler,
            sink,
            work_directory,
            session_id: session_id.into(),
            configuration,
        }
    }

    /// Handle onto the session's execution context.
    #[must_use]
    pub const fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Sink for protocol events.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn CallbackSink> {
        &self.sink
    }

    /// Per-session scratch directory.
    #[must_use]
    pub fn work_directory(&self) -> &Path {
        &self.work_directory
    }

    /// Unique identifier of this invocation.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The immutable plugin configuration.
    #[must_use]
    pub const fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Emits the terminal `finish` event and shuts the scheduler down.
    ///
    /// Emission failures are logged rather than propagated: by this point
    /// the session is over either way and the process is about to exit.
    pub fn finish(&self, state: ExitState, failure: Option<FailureReport>) {
        if let Err(err) = self.sink.report_finish(state, failure) {
            error!(error = %err, "failed to emit finish event");
        }
        self.scheduler.shutdown();
    }
}

/// Shared flag for cooperative cancellation.
///
/// The plugin's `stop` hook raises the flag; scan workers poll it and wind
/// themselves down. Raising is sticky and idempotent.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    raised: Arc<AtomicBool>,
}

impl StopFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Returns whether a stop has been requested.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
