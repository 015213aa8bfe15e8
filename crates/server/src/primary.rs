// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Primary ingestion service: one JSON POST per event.

use std::time::Duration;

use dn_core::Event;

use crate::{SendStatus, API_KEY_HEADER};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness check: `GET <host>/`, any 2xx is healthy.
pub async fn is_healthy(client: &reqwest::Client, server_host: &str) -> bool {
    match client.get(format!("{server_host}/")).timeout(HEALTH_TIMEOUT).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Send one event: `POST <host>/log` with `{"pipelines", "log_data"}`.
pub async fn send(
    client: &reqwest::Client,
    server_host: &str,
    event: &Event,
    api_key: &str,
) -> SendStatus {
    match client
        .post(format!("{server_host}/log"))
        .json(&event.to_body())
        .header(API_KEY_HEADER, api_key)
        .timeout(SEND_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => SendStatus::from_status(response.status().as_u16()),
        Err(e) => {
            tracing::debug!(error = %e, "primary transport error");
            SendStatus::unavailable()
        }
    }
}
