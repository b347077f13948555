//! Target URL parsing shared by scan plugins.
//!
//! Most plugins need the same breakdown of the configured `target`: scheme,
//! host, effective port, and path. [`site_info`] parses it once so plugins
//! do not each reinvent URL handling.

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::Configuration;

/// Errors raised while resolving target information.
#[derive(Debug, Error)]
pub enum SiteError {
    /// The configuration carries no `target` key.
    #[error("configuration has no 'target' key")]
    MissingTarget,

    /// The target value could not be parsed as a URL.
    #[error("invalid target URL '{target}': {source}")]
    InvalidUrl {
        /// The offending value.
        target: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The URL has no host component.
    #[error("target URL '{target}' has no host")]
    MissingHost {
        /// The offending value.
        target: String,
    },

    /// The URL scheme has no default port and none was given.
    #[error("target URL '{target}' has no port and scheme '{scheme}' no default")]
    UnknownPort {
        /// The offending value.
        target: String,
        /// Scheme that was found.
        scheme: String,
    },
}

/// Parsed form of the configured scan target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteInfo {
    /// The raw target URL as configured.
    pub url: String,
    /// URL scheme, e.g. `https`.
    pub scheme: String,
    /// Host component.
    pub host: String,
    /// Explicit port or the scheme default (80/443).
    pub port: u16,
    /// Path component, `/` when absent.
    pub path: String,
}

/// Parses the configuration's `target` into a [`SiteInfo`].
///
/// # Errors
///
/// Returns a [`SiteError`] when the key is missing, the URL malformed, or
/// host/port cannot be determined.
pub fn site_info(configuration: &Configuration) -> Result<SiteInfo, SiteError> {
    let target = configuration.target().ok_or(SiteError::MissingTarget)?;
    let parsed = Url::parse(target).map_err(|source| SiteError::InvalidUrl {
        target: target.to_owned(),
        source,
    })?;

    let host = parsed
        .host_str()
        .ok_or_else(|| SiteError::MissingHost {
            target: target.to_owned(),
        })?
        .to_owned();
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| SiteError::UnknownPort {
            target: target.to_owned(),
            scheme: parsed.scheme().to_owned(),
        })?;

    Ok(SiteInfo {
        url: target.to_owned(),
        scheme: parsed.scheme().to_owned(),
        host,
        port,
        path: parsed.path().to_owned(),
    })
}
