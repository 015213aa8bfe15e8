// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Uniform result record shared by every sink adapter.

/// Outcome of one send attempt. Exactly one of `success`, `is_failure`,
/// `is_unavailable` is true in well-formed cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendStatus {
    pub success: bool,
    pub status_code: Option<u16>,
    /// Protocol failure (300..=500): drop, do not retry.
    pub is_failure: bool,
    /// Transport failure or >500: requeue and mark the endpoint down.
    pub is_unavailable: bool,
}

impl SendStatus {
    /// Partition an HTTP status: 2xx success, 300..=500 failure, >500
    /// unavailable.
    pub fn from_status(code: u16) -> Self {
        Self {
            success: (200..300).contains(&code),
            status_code: Some(code),
            is_failure: (300..=500).contains(&code),
            is_unavailable: code > 500,
        }
    }

    /// Connection error, DNS failure, timeout.
    pub fn unavailable() -> Self {
        Self { success: false, status_code: None, is_failure: false, is_unavailable: true }
    }

    /// Local failure before the request left the process (e.g. a batch that
    /// would not encode). Treated like a protocol failure: drop, don't retry.
    pub fn local_failure() -> Self {
        Self { success: false, status_code: None, is_failure: true, is_unavailable: false }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
