//! Plugin hosting framework for the Patrol scan runner.
//!
//! The `patrol-plugins` crate implements the session layer that lets the
//! `patrol-runner` binary host one long-running scan plugin and report its
//! progress to a supervising process as line-delimited JSON on the primary
//! output stream.
//!
//! # Architecture
//!
//! A session is one plugin invocation. The [`PluginRunner`] resolves the
//! plugin through the [`PluginRegistry`], binds a [`PluginContext`] (sink,
//! scheduler handle, work directory, session id, configuration), and drives
//! the configure/start/stop lifecycle. All asynchronous plugin work and all
//! externally triggered stop requests execute on the single-threaded
//! [`Scheduler`], so session state needs no locking. The runner is the sole
//! fault boundary: a failing lifecycle hook becomes a structured
//! [`FailureReport`] inside exactly one terminal `finish` event, never a
//! crash.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use patrol_plugins::blocking::{BlockingScan, ScanEnv, ScanOutcome};
//! use patrol_plugins::{
//!     Configuration, JsonLineSink, PluginContext, PluginRegistry, PluginRunner, Scheduler,
//! };
//!
//! let mut registry = PluginRegistry::new();
//! registry
//!     .register("hello", || {
//!         Ok(Box::new(BlockingScan::new(|env: &ScanEnv| -> ScanOutcome {
//!             env.sink().report_progress(100, "hello")?;
//!             Ok(None)
//!         })))
//!     })
//!     .expect("register hello");
//!
//! let scheduler = Scheduler::new();
//! let sink = Arc::new(JsonLineSink::new(Vec::new()));
//! let context = PluginContext::new(
//!     scheduler.handle(),
//!     sink,
//!     std::env::temp_dir(),
//!     "session-1",
//!     Arc::new(Configuration::new()),
//! );
//!
//! let mut runner = PluginRunner::load(&registry, "hello", context).expect("load");
//! if runner.run() {
//!     scheduler.run(&mut runner);
//! }
//! ```

pub mod blocking;
pub mod config;
pub mod error;
pub mod event;
pub mod external;
pub mod issue;
pub mod plugin;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod sink;
pub mod site;

#[cfg(test)]
mod tests;

pub use self::config::{Configuration, ConfigurationError};
pub use self::error::PluginError;
pub use self::event::{Event, ExitState, FailureReport};
pub use self::plugin::{Fault, PluginContext, ScanPlugin, StopFlag};
pub use self::registry::PluginRegistry;
pub use self::runner::PluginRunner;
pub use self::scheduler::{Scheduler, SchedulerHandle, Task};
pub use self::sink::{CallbackSink, JsonLineSink};
pub use self::site::{SiteError, SiteInfo, site_info};
