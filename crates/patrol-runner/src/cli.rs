//! CLI argument definitions for the Patrol plugin runner.

use std::path::PathBuf;

use clap::Parser;

/// Command-line interface for hosting a single scan plugin session.
#[derive(Parser, Debug)]
#[command(name = "patrol-runner", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Name of the plugin to run.
    #[arg(short = 'p', long)]
    pub(crate) plugin: String,
    /// Plugin configuration as an inline JSON object.
    #[arg(short = 'c', long, conflicts_with = "configuration_file")]
    pub(crate) configuration: Option<String>,
    /// Path to a file holding the plugin configuration as JSON.
    #[arg(long)]
    pub(crate) configuration_file: Option<PathBuf>,
    /// Directory under which the per-session work directory is created.
    #[arg(long)]
    pub(crate) work_root: Option<PathBuf>,
    /// Session identifier; generated when omitted.
    #[arg(short = 's', long)]
    pub(crate) session: Option<String>,
    /// Lowers the default log filter to debug.
    #[arg(long)]
    pub(crate) debug: bool,
}
