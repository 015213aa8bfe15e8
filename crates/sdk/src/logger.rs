// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! The user-facing logging façade.
//!
//! Each call builds the payload, evaluates the compiled rules, writes one
//! JSON line to stdout when the stdout flag comes back true (or when no
//! rules are configured at all), and submits matched pipelines to the
//! processor. The stdout outcome is observed synchronously; pipeline
//! delivery is asynchronous.

use std::io::Write;
use std::panic::Location;
use std::sync::Arc;

use serde_json::Value;

use crate::level::Level;
use crate::payload::build_payload;
use crate::sdk::SdkShared;
use crate::trace;

/// A module-scoped logger. Cheap to clone.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<SdkShared>,
    module_name: String,
}

impl Logger {
    pub(crate) fn new(shared: Arc<SdkShared>, module_name: String) -> Self {
        Self { shared, module_name }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, context: Value, trace_id: Option<&str>) -> Option<Value> {
        self.log(Level::Debug, message, context, trace_id)
    }

    #[track_caller]
    pub fn info(&self, message: &str, context: Value, trace_id: Option<&str>) -> Option<Value> {
        self.log(Level::Info, message, context, trace_id)
    }

    #[track_caller]
    pub fn warning(&self, message: &str, context: Value, trace_id: Option<&str>) -> Option<Value> {
        self.log(Level::Warning, message, context, trace_id)
    }

    #[track_caller]
    pub fn error(&self, message: &str, context: Value, trace_id: Option<&str>) -> Option<Value> {
        self.log(Level::Error, message, context, trace_id)
    }

    #[track_caller]
    pub fn critical(&self, message: &str, context: Value, trace_id: Option<&str>) -> Option<Value> {
        self.log(Level::Critical, message, context, trace_id)
    }

    /// Evaluate one log call. Returns the payload when rules are configured,
    /// `None` otherwise.
    #[track_caller]
    fn log(
        &self,
        level: Level,
        message: &str,
        context: Value,
        trace_id: Option<&str>,
    ) -> Option<Value> {
        let trace_id = trace::resolve(trace_id);
        let payload = build_payload(
            level,
            message,
            &context,
            &trace_id,
            &self.module_name,
            Location::caller(),
        );

        if self.shared.no_rules {
            // No rules at all: everything at or above the configured level
            // goes to stdout.
            if level >= self.shared.stdout_level {
                emit_stdout(&payload);
            }
            return None;
        }

        let (pipelines, stdout) = self.shared.rules.evaluate(&payload);
        if stdout && level >= self.shared.stdout_level {
            emit_stdout(&payload);
        }
        if !pipelines.is_empty() {
            if let Some(processor) = &self.shared.processor {
                if !processor.submit(pipelines, payload.clone()) {
                    tracing::warn!("delivery queue full, event not enqueued");
                }
            }
        }
        Some(payload)
    }
}

/// One JSON line per event.
fn emit_stdout(payload: &Value) {
    let Ok(line) = serde_json::to_string(payload) else {
        return;
    };
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
