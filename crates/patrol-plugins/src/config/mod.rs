//! Immutable per-session plugin configuration.
//!
//! A configuration is a flat JSON object loaded once at bootstrap (inline or
//! from a file) and shared by reference with the plugin. The runner itself
//! only recognises the optional `report_dir` key; everything else is plugin
//! vocabulary.

use serde_json::{Map, Value};
use thiserror::Error;

/// Key naming the directory scan reports should be written to.
const REPORT_DIR_KEY: &str = "report_dir";

/// Key naming the scan target URL, used by the site helper.
const TARGET_KEY: &str = "target";

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configuration text was not valid JSON.
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// The configuration parsed to something other than a JSON object.
    #[error("configuration must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

/// Immutable mapping of string keys to JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: Map<String, Value>,
}

impl Configuration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] for malformed JSON and
    /// [`ConfigurationError::NotAnObject`] for non-object payloads.
    pub fn parse(text: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_json::from_str(text).map_err(ConfigurationError::Parse)?;
        Self::from_value(value)
    }

    /// Builds a configuration from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NotAnObject`] when the value is not an
    /// object.
    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ConfigurationError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Looks up a raw configuration value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the configured report directory, if any.
    #[must_use]
    pub fn report_dir(&self) -> Option<&str> {
        self.get(REPORT_DIR_KEY).and_then(Value::as_str)
    }

    /// Returns the configured scan target URL, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.get(TARGET_KEY).and_then(Value::as_str)
    }

    /// Returns the underlying key/value map.
    #[must_use]
    pub const fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Human-readable JSON type name for error messages.
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
