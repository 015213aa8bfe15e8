// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Messages for the `SendLog` unary call: one request, one reply per
//! connection.

use serde::{Deserialize, Serialize};

/// A single log event handed to the sidecar agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogRequest {
    /// Canonical JSON of the log payload.
    pub json_data: String,
    /// Pipeline ids the event matched.
    pub pipelines: Vec<String>,
    pub api_key: String,
}

/// The sidecar's verdict for one [`LogRequest`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogReply {
    pub success: bool,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
