// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Builds the structured payload every log call produces.

use std::panic::Location;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::level::Level;

/// The full log document: message, severity, trace id, timestamp, caller
/// location, and the caller-supplied context.
pub(crate) fn build_payload(
    level: Level,
    message: &str,
    context: &Value,
    trace_id: &str,
    module_name: &str,
    caller: &Location<'_>,
) -> Value {
    json!({
        "message": message,
        "level": level.as_str(),
        "trace_id": trace_id,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        "module_name": module_name,
        "log_record": {
            "filename": caller.file(),
            // Caller function names are not observable in Rust; the module
            // name stands in for both fields.
            "function_name": "",
            "level": level.as_str(),
            "line_number": caller.line(),
            "module_name": module_name,
        },
        "context": context,
    })
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
