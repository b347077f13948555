//! Support for plugins that run blocking scan code.
//!
//! [`BlockingScan`] adapts a blocking closure into the [`ScanPlugin`]
//! lifecycle: `start` hands the body to a worker thread so the scheduler
//! thread is never blocked, and completion is posted back onto the scheduler
//! where the terminal event is emitted. A stop request raises the shared
//! [`StopFlag`]; the body is responsible for polling it and winding down,
//! after which the session finishes as `STOPPED` rather than `FINISHED`.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::Configuration;
use crate::event::ExitState;
use crate::plugin::{Fault, PluginContext, ScanPlugin, StopFlag};
use crate::sink::CallbackSink;

/// Tracing target for blocking scan workers.
const BLOCKING_TARGET: &str = "patrol_plugins::blocking";

/// Environment a scan worker executes against.
///
/// A clone of the session context plus the cooperative stop flag; everything
/// here is safe to use from the worker thread. Shared with the external
/// process adapter in [`crate::external`].
#[derive(Debug, Clone)]
pub struct ScanEnv {
    context: PluginContext,
    stop: StopFlag,
}

impl ScanEnv {
    pub(crate) fn new(context: PluginContext, stop: StopFlag) -> Self {
        Self { context, stop }
    }

    pub(crate) const fn context(&self) -> &PluginContext {
        &self.context
    }

    /// Sink for emitting protocol events from the worker.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn CallbackSink> {
        self.context.sink()
    }

    /// Flag the body must poll to honour stop requests.
    #[must_use]
    pub const fn stop(&self) -> &StopFlag {
        &self.stop
    }

    /// The immutable plugin configuration.
    #[must_use]
    pub const fn configuration(&self) -> &Arc<Configuration> {
        self.context.configuration()
    }

    /// Per-session scratch directory.
    #[must_use]
    pub fn work_directory(&self) -> &Path {
        self.context.work_directory()
    }

    /// Unique identifier of this invocation.
    #[must_use]
    pub fn session_id(&self) -> &str {
        self.context.session_id()
    }
}

/// Outcome of a blocking scan body.
///
/// `Ok(None)` lets the adapter pick `FINISHED` or `STOPPED` based on the
/// stop flag; `Ok(Some(state))` forces an explicit terminal state.
pub type ScanOutcome = Result<Option<ExitState>, Fault>;

/// Adapter running a blocking scan body on a worker thread.
///
/// # Example
///
/// ```
/// use patrol_plugins::blocking::{BlockingScan, ScanEnv, ScanOutcome};
///
/// let plugin = BlockingScan::new(|env: &ScanEnv| -> ScanOutcome {
///     env.sink().report_progress(100, "done")?;
///     Ok(None)
/// });
/// # drop(plugin);
/// ```
pub struct BlockingScan<F> {
    body: Option<F>,
    stop: StopFlag,
}

impl<F> BlockingScan<F>
where
    F: FnOnce(&ScanEnv) -> ScanOutcome + Send + 'static,
{
    /// Wraps a scan body.
    #[must_use]
    pub fn new(body: F) -> Self {
        Self {
            body: Some(body),
            stop: StopFlag::new(),
        }
    }
}

impl<F> ScanPlugin for BlockingScan<F>
where
    F: FnOnce(&ScanEnv) -> ScanOutcome + Send + 'static,
{
    fn configure(&mut self, _ctx: &PluginContext) -> Result<(), Fault> {
        Ok(())
    }

    fn start(&mut self, ctx: &PluginContext) -> Result<(), Fault> {
        let body = self
            .body
            .take()
            .ok_or_else(|| Fault::from("scan body already consumed"))?;
        let env = ScanEnv::new(ctx.clone(), self.stop.clone());
        thread::Builder::new()
            .name(String::from("patrol-scan"))
            .spawn(move || {
                let outcome = body(&env);
                complete(&env, outcome);
            })
            .map_err(|error| -> Fault { Box::new(error) })?;
        Ok(())
    }

    fn stop(&mut self, _ctx: &PluginContext) -> Result<(), Fault> {
        self.stop.raise();
        Ok(())
    }
}

/// Posts terminal reporting back onto the scheduler thread.
fn complete(env: &ScanEnv, outcome: ScanOutcome) {
    let context = env.context.clone();
    let stop = env.stop.clone();
    env.context.scheduler().post(move || match outcome {
        Ok(explicit) => {
            let state = explicit.unwrap_or(if stop.is_raised() {
                ExitState::Stopped
            } else {
                ExitState::Finished
            });
            debug!(target: BLOCKING_TARGET, %state, "scan body completed");
            context.finish(state, None);
        }
        Err(fault) => {
            // Mirror of the failure path plugins expect: the fault becomes
            // an error issue, the session finishes FAILED.
            let issue = json!({"Severity": "Error", "Summary": fault.to_string()});
            if let Err(error) = context.sink().report_issues(&[issue]) {
                warn!(target: BLOCKING_TARGET, error = %error, "failed to report scan fault");
            }
            context.finish(ExitState::Failed, None);
        }
    });
}
