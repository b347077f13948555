//! Ordered, flushed serialisation of events to the output stream.
//!
//! The [`CallbackSink`] trait is the seam between plugins and the transport:
//! plugins call the `report_*` methods, the runner emits lifecycle events
//! through the same interface, and tests substitute a recording double.
//! [`JsonLineSink`] is the production implementation writing one JSON object
//! per line to the process's primary output stream.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::error::PluginError;
use crate::event::{Event, ExitState, FailureReport};

/// Event sink used by the runner and by plugins to notify the supervisor.
///
/// The provided `report_*` methods mirror the protocol operations and all
/// funnel through [`emit`](CallbackSink::emit), so implementations only
/// define how a single event reaches the stream.
pub trait CallbackSink: Send + Sync {
    /// Writes one event to the stream.
    ///
    /// Writes must be atomic relative to one another and visible to the
    /// consumer without buffering delay.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::SerializeEvent`] or [`PluginError::Emit`] when
    /// the event cannot reach the stream.
    fn emit(&self, event: &Event) -> Result<(), PluginError>;

    /// Reports that the plugin has started.
    ///
    /// # Errors
    ///
    /// Propagates [`emit`](CallbackSink::emit) failures.
    fn report_start(&self) -> Result<(), PluginError> {
        self.emit(&Event::Start)
    }

    /// Reports progress of a long-running scan.
    ///
    /// The convenience takes whole percentages; plugins reporting
    /// fractional progress emit an [`Event::Progress`] directly.
    ///
    /// # Errors
    ///
    /// Propagates [`emit`](CallbackSink::emit) failures.
    fn report_progress(&self, percentage: u32, description: &str) -> Result<(), PluginError> {
        self.emit(&Event::Progress {
            percentage: percentage.into(),
            description: description.to_owned(),
        })
    }

    /// Reports a single found issue.
    ///
    /// # Errors
    ///
    /// Propagates [`emit`](CallbackSink::emit) failures.
    fn report_issue(&self, issue: &serde_json::Value) -> Result<(), PluginError> {
        self.emit(&Event::Issue(issue.clone()))
    }

    /// Reports found issues, one `issue` line per element in input order.
    ///
    /// # Errors
    ///
    /// Propagates [`emit`](CallbackSink::emit) failures; issues before the
    /// failing one have already been written.
    fn report_issues(&self, issues: &[serde_json::Value]) -> Result<(), PluginError> {
        for issue in issues {
            self.emit(&Event::Issue(issue.clone()))?;
        }
        Ok(())
    }

    /// Reports files the scan produced.
    ///
    /// # Errors
    ///
    /// Propagates [`emit`](CallbackSink::emit) failures.
    fn report_artifacts(&self, name: &str, paths: &[String]) -> Result<(), PluginError> {
        self.emit(&Event::Artifact {
            name: name.to_owned(),
            paths: paths.to_vec(),
        })
    }

    /// Reports the terminal state of the session.
    ///
    /// By protocol convention this terminates the stream; the sink does not
    /// enforce that.
    ///
    /// # Errors
    ///
    /// Propagates [`emit`](CallbackSink::emit) failures.
    fn report_finish(
        &self,
        state: ExitState,
        failure: Option<FailureReport>,
    ) -> Result<(), PluginError> {
        self.emit(&Event::finish(state, failure))
    }
}

/// Production sink writing line-delimited JSON to a writer.
///
/// Each event is written and flushed under a single lock acquisition, so
/// lines are never interleaved even when worker threads emit concurrently
/// with the scheduler thread.
#[derive(Debug)]
pub struct JsonLineSink<W> {
    writer: Mutex<W>,
}

impl JsonLineSink<io::Stdout> {
    /// Builds a sink over the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLineSink<W> {
    /// Wraps a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> CallbackSink for JsonLineSink<W> {
    fn emit(&self, event: &Event) -> Result<(), PluginError> {
        let line = serde_json::to_string(event).map_err(PluginError::SerializeEvent)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}").map_err(PluginError::emit)?;
        writer.flush().map_err(PluginError::emit)
    }
}
