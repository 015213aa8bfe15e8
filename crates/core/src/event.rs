// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! The unit of delivery handed from the façade to the async processor.

use serde_json::json;

/// A matched log event queued for delivery.
///
/// Owned by exactly one holder at a time: the queue, a worker, a sink call,
/// the writeback buffer, or the dropped-store writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Pipeline ids that matched during rule evaluation.
    pub pipelines: Vec<String>,
    /// The full structured log payload.
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(pipelines: Vec<String>, payload: serde_json::Value) -> Self {
        Self { pipelines, payload }
    }

    /// Wire body shared by the primary sink, fallback batch lines and
    /// dropped records: `{"pipelines": [...], "log_data": {...}}`.
    pub fn to_body(&self) -> serde_json::Value {
        json!({ "pipelines": self.pipelines, "log_data": self.payload })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
