// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Per-endpoint health state with background recovery probes.
//!
//! Readers may see stale values; the worst case is one request against a
//! just-downed endpoint, which the worker requeues anyway.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

const PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// A liveness check for one endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    async fn check(&self) -> bool;
}

/// Stock probe: `GET <host>/`, 2 s timeout, any 2xx is healthy.
pub struct HttpLivenessProbe {
    client: reqwest::Client,
    host: String,
}

impl HttpLivenessProbe {
    pub fn new(host: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), host: host.into() }
    }
}

#[async_trait]
impl HealthProbe for HttpLivenessProbe {
    async fn check(&self) -> bool {
        dn_server::primary::is_healthy(&self.client, &self.host).await
    }
}

/// Shared up/down map for the primary and fallback endpoints.
#[derive(Clone)]
pub struct HealthMonitor {
    healthy: Arc<Mutex<HashMap<String, bool>>>,
    /// Endpoint keys with a live probe task; at most one per key.
    probing: Arc<Mutex<HashSet<String>>>,
    handle: tokio::runtime::Handle,
}

impl HealthMonitor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            healthy: Arc::new(Mutex::new(HashMap::new())),
            probing: Arc::new(Mutex::new(HashSet::new())),
            handle,
        }
    }

    fn key(server_host: &str, is_fallback: bool) -> String {
        if is_fallback {
            format!("fallback:{server_host}")
        } else {
            server_host.to_string()
        }
    }

    /// Cached state; unknown endpoints default to healthy.
    pub fn is_up(&self, server_host: &str, is_fallback: bool) -> bool {
        let key = Self::key(server_host, is_fallback);
        self.healthy.lock().get(&key).copied().unwrap_or(true)
    }

    /// Mark an endpoint down and make sure a recovery probe is running for
    /// it. The probe loops until the endpoint answers; there is no timeout
    /// on recovery.
    pub fn mark_down(&self, server_host: &str, is_fallback: bool, probe: Arc<dyn HealthProbe>) {
        let key = Self::key(server_host, is_fallback);

        {
            let mut healthy = self.healthy.lock();
            if healthy.get(&key).copied().unwrap_or(true) {
                tracing::warn!(server = %key, "server marked down");
            }
            healthy.insert(key.clone(), false);
        }

        {
            let mut probing = self.probing.lock();
            if !probing.insert(key.clone()) {
                return;
            }
        }

        let healthy = Arc::clone(&self.healthy);
        let probing = Arc::clone(&self.probing);
        self.handle.spawn(async move {
            loop {
                tokio::time::sleep(PROBE_INTERVAL).await;
                if probe.check().await {
                    healthy.lock().insert(key.clone(), true);
                    tracing::debug!(server = %key, "server recovered");
                    break;
                }
            }
            probing.lock().remove(&key);
        });
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
