//! Issue payload normalisation.
//!
//! Issues are opaque to the runner, but plugins share one convention: each
//! issue carries a stable `Id` derived from its identifying fields so the
//! supervisor can correlate findings across scans of the same target. The
//! id is the SHA-256 of `Summary:cwe_id:URL:Parameter` for web issues, or
//! `Summary:cwe_id:URL[:Port]` otherwise, matching what report consumers
//! already key on. Triage defaults (`False_positive`, `Ignored`) are filled
//! in when absent.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Assigns ids and triage defaults to a batch of issues in place.
///
/// Non-object entries are left untouched; an existing `Id` is overwritten so
/// re-normalisation stays deterministic.
pub fn assign_ids(issues: &mut [Value]) {
    for issue in issues {
        assign_id(issue);
    }
}

fn assign_id(issue: &mut Value) {
    let key = identity_key(issue);
    let Some(object) = issue.as_object_mut() else {
        return;
    };
    let digest = Sha256::digest(key.as_bytes());
    object.insert(String::from("Id"), Value::String(format!("{digest:x}")));
    object
        .entry("False_positive")
        .or_insert(Value::Bool(false));
    object.entry("Ignored").or_insert(Value::Bool(false));
}

/// Builds the identity string an issue is hashed over.
fn identity_key(issue: &Value) -> String {
    let summary = issue.get("Summary").and_then(Value::as_str).unwrap_or("");
    let cwe_id = issue
        .get("Classification")
        .and_then(|classification| classification.get("cwe_id"))
        .and_then(Value::as_str)
        .unwrap_or("");

    let first_url = issue
        .get("URLs")
        .and_then(Value::as_array)
        .and_then(|urls| urls.first());
    let url = first_url
        .and_then(|entry| entry.get("URL"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let parameter = first_url
        .and_then(|entry| entry.get("Parameter"))
        .and_then(Value::as_str)
        .unwrap_or("");

    // Web issues key on the parameter; network issues on the first port.
    if parameter.is_empty() {
        let port = issue
            .get("Ports")
            .and_then(Value::as_array)
            .and_then(|ports| ports.first());
        port.map_or_else(
            || format!("{summary}:{cwe_id}:{url}"),
            |port| {
                let port = port.as_str().map_or_else(|| port.to_string(), str::to_owned);
                format!("{summary}:{cwe_id}:{url}:{port}")
            },
        )
    } else {
        format!("{summary}:{cwe_id}:{url}:{parameter}")
    }
}
