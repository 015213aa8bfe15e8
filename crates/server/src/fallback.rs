// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Fallback batching service: gzipped JSONL uploads.

use std::io::Write;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;

use dn_core::Event;

use crate::{SendStatus, API_KEY_HEADER};

// Longer timeout for batch upload
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Encode a batch as gzipped newline-delimited JSON, one object per event.
pub fn encode_jsonl_gz(events: &[Event]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for event in events {
        let line = serde_json::to_vec(&event.to_body()).map_err(std::io::Error::from)?;
        encoder.write_all(&line)?;
        encoder.write_all(b"\n")?;
    }
    encoder.finish()
}

/// Send a batch: `POST <host>/upload` with a gzipped JSONL body.
pub async fn send(
    client: &reqwest::Client,
    server_host: &str,
    events: &[Event],
    api_key: &str,
) -> SendStatus {
    let compressed = match encode_jsonl_gz(events) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, batch_size = events.len(), "batch encoding failed");
            return SendStatus::local_failure();
        }
    };

    match client
        .post(format!("{server_host}/upload"))
        .body(compressed)
        .header("Content-Type", "application/octet-stream")
        .header(API_KEY_HEADER, api_key)
        .timeout(SEND_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => SendStatus::from_status(response.status().as_u16()),
        Err(e) => {
            tracing::debug!(error = %e, "fallback transport error");
            SendStatus::unavailable()
        }
    }
}

#[cfg(test)]
#[path = "fallback_tests.rs"]
mod tests;
