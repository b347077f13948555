//! Hosts a single scan plugin session from the command line.
//!
//! `patrol-runner` is the process a supervising backend launches per scan:
//! it parses arguments, loads the plugin configuration, prepares the session
//! directories, resolves the requested plugin from the built-in registry,
//! and drives it on the scheduler thread until the plugin reports `finish`.
//! Scan events stream to stdout as line-delimited JSON; diagnostics go to
//! stderr via `tracing`.

use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use patrol_plugins::{
    CallbackSink, ExitState, FailureReport, JsonLineSink, PluginContext, PluginRunner, Scheduler,
};

pub mod bootstrap;
pub mod builtin;
mod cli;
pub mod signals;
pub mod telemetry;

use crate::bootstrap::BootstrapError;
use crate::cli::Cli;

/// Tracing target for the session orchestration.
const RUN_TARGET: &str = "patrol_runner";

/// Parses arguments and runs one plugin session to completion.
///
/// Returns success after any session that produced its own terminal event,
/// including lifecycle failures; only bootstrap problems (bad arguments,
/// unreadable configuration, directory or plugin resolution failures) exit
/// nonzero.
pub fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => error.exit(),
    };
    if let Err(source) = telemetry::initialise(cli.debug) {
        // Telemetry is not worth dying for; the session still runs.
        error!(target: RUN_TARGET, error = %source, "telemetry initialisation failed");
    }
    host_session(cli)
}

/// Bootstraps and drives the session described by the parsed arguments.
fn host_session(cli: Cli) -> ExitCode {
    let configuration = match bootstrap::load_configuration(
        cli.configuration.as_deref(),
        cli.configuration_file.as_deref(),
    ) {
        Ok(configuration) => configuration,
        Err(source) => {
            error!(target: RUN_TARGET, error = %source, "configuration rejected");
            return ExitCode::FAILURE;
        }
    };
    let session = bootstrap::session_id(cli.session);
    let sink: Arc<dyn CallbackSink> = Arc::new(JsonLineSink::stdout());

    let work_directory = match bootstrap::prepare_work_directory(cli.work_root, &session) {
        Ok(path) => path,
        Err(source) => return fail_bootstrap(sink.as_ref(), &source),
    };
    if let Err(source) = bootstrap::prepare_report_directory(&configuration) {
        return fail_bootstrap(sink.as_ref(), &source);
    }

    let registry = match builtin::registry() {
        Ok(registry) => registry,
        Err(source) => {
            error!(target: RUN_TARGET, error = %source, "plugin registry failed to build");
            return ExitCode::FAILURE;
        }
    };

    let scheduler = Scheduler::new();
    let context = PluginContext::new(
        scheduler.handle(),
        sink,
        work_directory,
        session,
        Arc::new(configuration),
    );
    let mut runner = match PluginRunner::load(&registry, &cli.plugin, context) {
        Ok(runner) => runner,
        Err(source) => {
            error!(target: RUN_TARGET, error = %source, plugin = %cli.plugin, "plugin failed to load");
            return ExitCode::FAILURE;
        }
    };

    if let Err(source) = signals::install(scheduler.handle()) {
        error!(target: RUN_TARGET, error = %source, "signal bridge unavailable");
        return ExitCode::FAILURE;
    }

    if runner.run() {
        scheduler.run(&mut runner);
    }
    ExitCode::SUCCESS
}

/// Reports a fatal bootstrap error on the event stream and fails the process.
fn fail_bootstrap(sink: &dyn CallbackSink, source: &BootstrapError) -> ExitCode {
    error!(target: RUN_TARGET, error = %source, "session bootstrap failed");
    if let Some(message) = source.finish_message() {
        let report = FailureReport::new(message, source.to_string());
        if let Err(emit_error) = sink.report_finish(ExitState::Failed, Some(report)) {
            error!(target: RUN_TARGET, error = %emit_error, "failed to report bootstrap failure");
        }
    }
    ExitCode::FAILURE
}
