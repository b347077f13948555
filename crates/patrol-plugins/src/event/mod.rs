//! Wire types for the runner-to-supervisor event protocol.
//!
//! Every event is serialised as a single JSON object per line on the primary
//! output stream, tagged by a `msg` discriminator with the payload under
//! `data`. The supervisor reconstructs the session timeline from the stream,
//! so emission order is part of the contract and a single `finish` event
//! terminates it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal states a plugin session can finish in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitState {
    /// The scan ran to completion.
    Finished,
    /// The scan wound down after a stop request.
    Stopped,
    /// The scan failed; a failure report usually accompanies this state.
    Failed,
    /// The scan was abandoned before producing a result.
    Aborted,
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Finished => "FINISHED",
            Self::Stopped => "STOPPED",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
        };
        f.write_str(text)
    }
}

/// Structured description of a caught lifecycle failure.
///
/// Produced only when a lifecycle phase fails; delivered inside the `finish`
/// event so the supervisor can attribute the failure to a host and phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Which lifecycle phase failed, e.g. `Failed to configure plugin`.
    pub message: String,
    /// Rendered form of the underlying fault.
    pub exception: String,
    /// Name of the host the runner was executing on.
    pub hostname: String,
}

impl FailureReport {
    /// Builds a report for the current host.
    #[must_use]
    pub fn new(message: impl Into<String>, exception: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exception: exception.into(),
            hostname: local_hostname(),
        }
    }
}

/// Returns the local hostname, falling back to `unknown` when unavailable.
fn local_hostname() -> String {
    nix::unistd::gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from("unknown"))
}

/// One unit of the output protocol.
///
/// Serialised adjacently tagged: `{"msg":"progress","data":{...}}`. The
/// `start` event carries no payload and serialises as `{"msg":"start"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", content = "data", rename_all = "lowercase")]
pub enum Event {
    /// The plugin passed configuration and is about to start.
    Start,
    /// Incremental progress from a long-running scan.
    Progress {
        /// Completion estimate, integral or fractional. The sink performs
        /// no range validation; out-of-range values are a plugin-level
        /// concern.
        percentage: serde_json::Number,
        /// Short human-readable description of the current activity.
        description: String,
    },
    /// A single issue found by the scan. The payload is opaque to the
    /// runner; only plugins and the supervisor interpret it.
    Issue(serde_json::Value),
    /// Files produced by the scan and left in the work directory.
    Artifact {
        /// Logical name of the artifact group.
        name: String,
        /// Paths to the produced files, in plugin-chosen order.
        paths: Vec<String>,
    },
    /// Terminal event for the session.
    Finish {
        /// The state the session finished in.
        state: ExitState,
        /// Failure details, present only for runner-reported failures.
        /// Absence is serialised as the empty string per the protocol.
        #[serde(with = "failure_repr")]
        failure: Option<FailureReport>,
    },
}

impl Event {
    /// Builds a `finish` event.
    #[must_use]
    pub const fn finish(state: ExitState, failure: Option<FailureReport>) -> Self {
        Self::Finish { state, failure }
    }
}

/// Serialises the optional failure report as `""` when absent.
///
/// The consumer treats the `failure` field as either an empty string or a
/// report object, so `null` is not a valid encoding.
mod failure_repr {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::FailureReport;

    pub fn serialize<S>(value: &Option<FailureReport>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(report) => report.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<FailureReport>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::String(text) if text.is_empty() => Ok(None),
            serde_json::Value::String(text) => Err(D::Error::custom(format!(
                "expected empty string or failure object, got '{text}'"
            ))),
            other => serde_json::from_value(other).map(Some).map_err(|error| {
                D::Error::custom(format!("invalid failure report: {error}"))
            }),
        }
    }
}
