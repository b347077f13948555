//! Plugin runner owning the session lifecycle.
//!
//! The [`PluginRunner`] resolves a plugin through the
//! [`PluginRegistry`](crate::registry::PluginRegistry), binds its
//! [`PluginContext`], and drives it through configure/start/stop. It is the
//! sole boundary for lifecycle faults: a failing hook is converted into a
//! [`FailureReport`] on the output stream and never unwinds further. The
//! runner emits at most one terminal `finish` event itself; a plugin that
//! reached the running state reports its own.

use tracing::{debug, warn};

use crate::error::PluginError;
use crate::event::{ExitState, FailureReport};
use crate::plugin::{Fault, PluginContext, ScanPlugin};
use crate::registry::PluginRegistry;

/// Tracing target for lifecycle transitions.
const RUNNER_TARGET: &str = "patrol_plugins::runner";

/// Failure message for a fault raised by `configure`.
const CONFIGURE_FAILURE: &str = "Failed to configure plugin";

/// Failure message for a fault raised by `start`.
const START_FAILURE: &str = "Failed to start plugin";

/// Owns one plugin instance bound to its session context.
///
/// No other component touches plugin state: plugins receive their context by
/// reference during lifecycle calls and communicate outwards only through
/// the sink and scheduler handle the context carries.
pub struct PluginRunner {
    name: String,
    plugin: Box<dyn ScanPlugin>,
    context: PluginContext,
    stopping: bool,
}

impl std::fmt::Debug for PluginRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRunner")
            .field("name", &self.name)
            .field("stopping", &self.stopping)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl PluginRunner {
    /// Resolves `name` through the registry and binds the session context.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] or [`PluginError::Construct`].
    /// Load failures are non-recoverable: no `finish` event can yet be
    /// meaningfully attributed, so the caller must abort the process.
    pub fn load(
        registry: &PluginRegistry,
        name: &str,
        context: PluginContext,
    ) -> Result<Self, PluginError> {
        let plugin = registry.construct(name)?;
        debug!(target: RUNNER_TARGET, plugin = name, session = context.session_id(), "plugin loaded");
        Ok(Self {
            name: name.to_owned(),
            plugin,
            context,
            stopping: false,
        })
    }

    /// Drives the plugin through `configure` and `start`.
    ///
    /// Returns `true` when both hooks succeeded and the plugin is running,
    /// expected to emit further events asynchronously and eventually report
    /// its own `finish`. Returns `false` after a lifecycle fault, in which
    /// case exactly one `finish(FAILED)` event has already been emitted and
    /// the caller can exit cleanly.
    pub fn run(&mut self) -> bool {
        debug!(target: RUNNER_TARGET, plugin = self.name, "configuring plugin");
        if let Err(fault) = self.plugin.configure(&self.context) {
            self.report_failure(CONFIGURE_FAILURE, &fault);
            return false;
        }

        if let Err(error) = self.context.sink().report_start() {
            // The stream is the control plane; keep going and let a later
            // emit failure surface through the plugin if it persists.
            warn!(target: RUNNER_TARGET, error = %error, "failed to emit start event");
        }

        debug!(target: RUNNER_TARGET, plugin = self.name, "starting plugin");
        if let Err(fault) = self.plugin.start(&self.context) {
            self.report_failure(START_FAILURE, &fault);
            return false;
        }

        debug!(target: RUNNER_TARGET, plugin = self.name, "plugin running");
        true
    }

    /// Requests a graceful stop of the plugin.
    ///
    /// Safe to call any number of times and at any point in the lifecycle.
    /// Marks the session as stopping, then invokes the plugin's `stop` hook;
    /// a fault from the hook is logged and swallowed, and no synthetic
    /// `finish` is emitted; the plugin remains responsible for reporting
    /// its own terminal state once it has wound down.
    pub fn stop(&mut self) {
        debug!(target: RUNNER_TARGET, plugin = self.name, "stop requested");
        self.stopping = true;
        if let Err(fault) = self.plugin.stop(&self.context) {
            warn!(target: RUNNER_TARGET, plugin = self.name, error = %fault, "plugin stop hook failed");
        }
    }

    /// Whether a stop has been requested for this session.
    #[must_use]
    pub const fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Name the plugin was resolved under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound session context.
    #[must_use]
    pub const fn context(&self) -> &PluginContext {
        &self.context
    }

    /// Converts a lifecycle fault into the single terminal failure event.
    fn report_failure(&self, message: &str, fault: &Fault) {
        warn!(target: RUNNER_TARGET, plugin = self.name, error = %fault, "{message}");
        let report = FailureReport::new(message, fault.to_string());
        if let Err(error) = self
            .context
            .sink()
            .report_finish(ExitState::Failed, Some(report))
        {
            warn!(target: RUNNER_TARGET, error = %error, "failed to emit failure report");
        }
    }
}

#[cfg(test)]
mod tests;
