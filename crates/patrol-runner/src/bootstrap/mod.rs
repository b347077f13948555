//! Session bootstrap: configuration loading, identifiers, and directories.
//!
//! Bootstrap runs before the plugin exists. Its failures are fatal and the
//! process exits nonzero, but directory failures still produce one terminal
//! `finish` event so the supervising process learns why the session died.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use patrol_plugins::{Configuration, ConfigurationError};

/// Tracing target for bootstrap steps.
const BOOTSTRAP_TARGET: &str = "patrol_runner::bootstrap";

/// Failure message reported when the work directory cannot be created.
const WORK_DIR_FAILURE: &str = "Failed to create work directory";

/// Failure message reported when the report directory cannot be created.
const REPORT_DIR_FAILURE: &str = "Failed to create report directory";

/// Errors surfaced while bootstrapping a session.
#[derive(Debug, Clone, Error)]
pub enum BootstrapError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    ReadConfiguration {
        /// Path that was passed on the command line.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The configuration text did not parse to a JSON object.
    #[error("failed to parse configuration: {source}")]
    ParseConfiguration {
        /// Underlying parse error.
        #[source]
        source: Arc<ConfigurationError>,
    },
    /// The per-session work directory could not be created.
    #[error("failed to create work directory '{path}': {source}")]
    CreateWorkDirectory {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The configured report directory could not be created.
    #[error("failed to create report directory '{path}': {source}")]
    CreateReportDirectory {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl BootstrapError {
    /// Message for the `finish` failure report, when one should be emitted.
    ///
    /// Configuration errors happen before the output stream carries meaning
    /// for the supervisor, so only directory failures report one.
    #[must_use]
    pub const fn finish_message(&self) -> Option<&'static str> {
        match self {
            Self::CreateWorkDirectory { .. } => Some(WORK_DIR_FAILURE),
            Self::CreateReportDirectory { .. } => Some(REPORT_DIR_FAILURE),
            Self::ReadConfiguration { .. } | Self::ParseConfiguration { .. } => None,
        }
    }
}

/// Loads the plugin configuration from inline JSON or a file.
///
/// With neither source supplied the configuration is empty, which is valid
/// for plugins without mandatory keys.
///
/// # Errors
///
/// Returns [`BootstrapError::ReadConfiguration`] when the file cannot be
/// read and [`BootstrapError::ParseConfiguration`] when the text is not a
/// JSON object.
pub fn load_configuration(
    inline: Option<&str>,
    file: Option<&Path>,
) -> Result<Configuration, BootstrapError> {
    let text = match (inline, file) {
        (Some(text), _) => text.to_owned(),
        (None, Some(path)) => {
            fs::read_to_string(path).map_err(|source| BootstrapError::ReadConfiguration {
                path: path.to_path_buf(),
                source: Arc::new(source),
            })?
        }
        (None, None) => return Ok(Configuration::new()),
    };
    Configuration::parse(&text).map_err(|source| BootstrapError::ParseConfiguration {
        source: Arc::new(source),
    })
}

/// Returns the given session id or generates a fresh one.
#[must_use]
pub fn session_id(given: Option<String>) -> String {
    given.unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Creates the per-session work directory under the work root.
///
/// The root defaults to the system temporary directory; intermediate
/// directories are created as needed.
///
/// # Errors
///
/// Returns [`BootstrapError::CreateWorkDirectory`] when creation fails.
pub fn prepare_work_directory(
    work_root: Option<PathBuf>,
    session: &str,
) -> Result<PathBuf, BootstrapError> {
    let root = work_root.unwrap_or_else(env::temp_dir);
    let path = root.join(session);
    fs::create_dir_all(&path).map_err(|source| BootstrapError::CreateWorkDirectory {
        path: path.clone(),
        source: Arc::new(source),
    })?;
    debug!(target: BOOTSTRAP_TARGET, path = %path.display(), "work directory ready");
    Ok(path)
}

/// Creates the configured report directory, when one is configured.
///
/// Only the final path component is created: a report directory under a
/// missing parent is a configuration mistake the supervisor must hear about,
/// not something to paper over.
///
/// # Errors
///
/// Returns [`BootstrapError::CreateReportDirectory`] when creation fails for
/// any reason other than the directory already existing.
pub fn prepare_report_directory(configuration: &Configuration) -> Result<(), BootstrapError> {
    let Some(report_dir) = configuration.report_dir() else {
        return Ok(());
    };
    let path = PathBuf::from(report_dir);
    match fs::create_dir(&path) {
        Ok(()) => {
            debug!(target: BOOTSTRAP_TARGET, path = %path.display(), "report directory created");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(BootstrapError::CreateReportDirectory {
            path,
            source: Arc::new(source),
        }),
    }
}

#[cfg(test)]
mod tests;
