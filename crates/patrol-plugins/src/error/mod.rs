//! Domain errors raised by plugin hosting operations.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! so error values stay small and cloneable.

use std::sync::Arc;

use thiserror::Error;

/// Errors arising from plugin resolution and event emission.
///
/// Lifecycle faults raised by a plugin's own `configure`/`start`/`stop` hooks
/// are deliberately not represented here: the runner converts those into a
/// [`FailureReport`](crate::event::FailureReport) on the output stream rather
/// than propagating them.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The requested plugin was not found in the registry.
    #[error("plugin '{name}' not found in registry")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },

    /// A plugin with the same name is already registered.
    #[error("plugin '{name}' is already registered")]
    AlreadyRegistered {
        /// Name of the conflicting registration.
        name: String,
    },

    /// The plugin factory failed to construct an instance.
    #[error("plugin '{name}' failed to construct: {message}")]
    Construct {
        /// Plugin name.
        name: String,
        /// Human-readable failure description.
        message: String,
    },

    /// An event could not be serialised to its wire form.
    #[error("failed to serialise event: {0}")]
    SerializeEvent(#[source] serde_json::Error),

    /// Writing an event line to the output stream failed.
    #[error("failed to emit event: {source}")]
    Emit {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl PluginError {
    /// Wraps an I/O error from the output stream.
    #[must_use]
    pub fn emit(source: std::io::Error) -> Self {
        Self::Emit {
            source: Arc::new(source),
        }
    }
}
