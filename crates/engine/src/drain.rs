// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Emergency drain worker.
//!
//! Idle by default; a `submit` that pushes the queue to the high watermark
//! spawns one drain task, which bleeds batches to the fallback service until
//! the queue is back under the low watermark, then dies. The singleton flag
//! resets on exit so a later spike can respawn it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dn_core::store_dropped_events;
use dn_server::{fallback, primary};

use crate::queue::SafeQueue;

const HIGH_WATERMARK: f64 = 0.90;
const LOW_WATERMARK: f64 = 0.10;
const BATCH_SIZE: usize = 100;
const RETRY_SLEEP: Duration = Duration::from_millis(100);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(100);
// 10 seconds max wait for the fallback to answer
const HEALTH_WAIT_ATTEMPTS: u32 = 100;

pub(crate) struct DrainWorker {
    queue: Arc<SafeQueue>,
    datanadhi_dir: PathBuf,
    fallback_server_host: String,
    api_key: String,
    running: Arc<AtomicBool>,
    handle: tokio::runtime::Handle,
}

impl DrainWorker {
    pub(crate) fn new(
        queue: Arc<SafeQueue>,
        datanadhi_dir: PathBuf,
        fallback_server_host: String,
        api_key: String,
        handle: tokio::runtime::Handle,
    ) -> Self {
        Self {
            queue,
            datanadhi_dir,
            fallback_server_host,
            api_key,
            running: Arc::new(AtomicBool::new(false)),
            handle,
        }
    }

    /// Spawn the drain task when the queue is at the high watermark and no
    /// drain task is live. Returns true iff a task was spawned.
    pub(crate) fn start_if_needed(&self) -> bool {
        if self.queue.fill_percentage() < HIGH_WATERMARK {
            return false;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        let queue = Arc::clone(&self.queue);
        let datanadhi_dir = self.datanadhi_dir.clone();
        let host = self.fallback_server_host.clone();
        let api_key = self.api_key.clone();
        let running = Arc::clone(&self.running);
        self.handle.spawn(async move {
            drain_loop(&queue, &datanadhi_dir, &host, &api_key).await;
            running.store(false, Ordering::SeqCst);
        });
        true
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn drain_loop(queue: &SafeQueue, datanadhi_dir: &std::path::Path, host: &str, api_key: &str) {
    let client = reqwest::Client::new();
    tracing::debug!(queue_fill = queue.fill_percentage(), "drain worker started");

    while queue.fill_percentage() > LOW_WATERMARK {
        if !wait_for_healthy_server(&client, host).await {
            tracing::error!(server = host, "drain worker stopped, fallback unreachable");
            break;
        }

        let items = queue.get_batch(BATCH_SIZE);
        if items.is_empty() {
            break;
        }

        let status = fallback::send(&client, host, &items, api_key).await;
        if status.success {
            for _ in &items {
                queue.task_done();
            }
            tracing::debug!(batch_size = items.len(), "drain worker sent batch");
        } else if status.is_unavailable {
            tracing::warn!(server = host, "drain worker: fallback unavailable, retrying");
            queue.writeback_batch(items);
            tokio::time::sleep(RETRY_SLEEP).await;
        } else {
            let batch_size = items.len();
            match store_dropped_events(datanadhi_dir, &items, "drain_worker_failed") {
                Ok(file) => tracing::error!(
                    status_code = ?status.status_code,
                    batch_size,
                    file = %file.display(),
                    "drain worker batch failed, data dropped"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    batch_size,
                    "drain worker batch failed and dropped store write failed"
                ),
            }
            for _ in 0..batch_size {
                queue.task_done();
            }
        }
    }

    tracing::debug!(queue_fill = queue.fill_percentage(), "drain worker stopped");
}

/// Poll the fallback liveness endpoint at 100 ms for up to 10 s.
async fn wait_for_healthy_server(client: &reqwest::Client, host: &str) -> bool {
    for _ in 0..HEALTH_WAIT_ATTEMPTS {
        if primary::is_healthy(client, host).await {
            return true;
        }
        tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
    }
    false
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
