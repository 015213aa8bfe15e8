// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! The per-directory async processor: queue, worker pool, routing.
//!
//! Routing per event: primary while it is healthy; otherwise the sidecar
//! unless it is disabled (by config or by the process-wide latch); otherwise
//! the fallback batch path. Transport failures requeue, protocol failures
//! drop to the store, and every accepted event is acknowledged exactly once.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use dn_config::ResolvedConfig;
use dn_core::{store_dropped_events, Event};
use dn_echopost::Sidecar;
use dn_server::{fallback, primary};

use crate::drain::DrainWorker;
use crate::health::{HealthMonitor, HttpLivenessProbe};
use crate::queue::SafeQueue;

const GET_TIMEOUT: Duration = Duration::from_secs(1);
const IDLE_SLEEP: Duration = Duration::from_millis(100);
const BACKOFF_SLEEP: Duration = Duration::from_millis(10);
const BATCH_SIZE: usize = 100;
const EMPTY_POLL: Duration = Duration::from_millis(100);

/// Async processor with queue-based workers and overflow protection.
///
/// One instance per `.datanadhi` directory; construction happens through
/// [`crate::ProcessState`]. Owns a dedicated runtime so submission never
/// depends on the host application's async machinery.
pub struct Processor {
    queue: Arc<SafeQueue>,
    drain: DrainWorker,
    exit_timeout: Duration,
    shutdown: CancellationToken,
    flushed: AtomicBool,
    /// `Some` until drop; taken there so the runtime can be shut down
    /// without blocking when the processor dies inside an async context.
    runtime: Option<tokio::runtime::Runtime>,
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor").finish_non_exhaustive()
    }
}

/// Everything a worker task needs, held by shared handles so tasks never
/// keep the processor (and its runtime) alive.
#[derive(Clone)]
struct WorkerCtx {
    datanadhi_dir: PathBuf,
    server_host: String,
    fallback_server_host: String,
    api_key: String,
    /// Sidecar disabled by configuration (the process latch is separate).
    echopost_disable: bool,
    queue: Arc<SafeQueue>,
    health: HealthMonitor,
    sidecar: Arc<Sidecar>,
    shutdown: CancellationToken,
}

impl Processor {
    /// Build the runtime, spawn the worker pool, and kick off the sidecar
    /// binary download in the background when the sidecar is enabled.
    pub(crate) fn start(
        datanadhi_dir: PathBuf,
        config: &ResolvedConfig,
        sidecar_latch: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let workers = config.async_workers.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("datanadhi-worker")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        let queue = Arc::new(SafeQueue::new(config.async_queue_size));
        let health = HealthMonitor::new(handle.clone());
        let sidecar = Arc::new(Sidecar::new(
            &datanadhi_dir,
            &config.api_key,
            &config.server_host,
            sidecar_latch,
        ));
        let drain = DrainWorker::new(
            Arc::clone(&queue),
            datanadhi_dir.clone(),
            config.fallback_server_host.clone(),
            config.api_key.clone(),
            handle.clone(),
        );
        let shutdown = CancellationToken::new();

        let ctx = WorkerCtx {
            datanadhi_dir,
            server_host: config.server_host.clone(),
            fallback_server_host: config.fallback_server_host.clone(),
            api_key: config.api_key.clone(),
            echopost_disable: config.echopost_disable,
            queue: Arc::clone(&queue),
            health,
            sidecar: Arc::clone(&sidecar),
            shutdown: shutdown.clone(),
        };

        for index in 0..workers {
            handle.spawn(worker_loop(index, ctx.clone()));
        }

        if !config.echopost_disable {
            handle.spawn(async move {
                if let Err(e) = sidecar.ensure_binary().await {
                    tracing::warn!(error = %e, "echopost binary unavailable");
                }
            });
        }

        Ok(Self {
            queue,
            drain,
            exit_timeout: config.exit_timeout(),
            shutdown,
            flushed: AtomicBool::new(false),
            runtime: Some(runtime),
        })
    }

    /// Non-blocking submission. False means the ring was full; the caller
    /// decides whether to tell anyone.
    pub fn submit(&self, pipelines: Vec<String>, payload: serde_json::Value) -> bool {
        let accepted = self.queue.add(Event::new(pipelines, payload));
        if accepted {
            self.drain.start_if_needed();
        }
        accepted
    }

    /// Wait for every accepted event to be acknowledged, bounded by the
    /// configured exit timeout, then stop the workers. Later calls are
    /// no-ops.
    pub fn flush(&self) {
        if self.flushed.swap(true, Ordering::SeqCst) {
            return;
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            // Called from inside an async context, where blocking on the
            // drain is not allowed. Stop the workers and leave the rest.
            tracing::warn!("flush from async context; skipping bounded drain wait");
            self.shutdown.cancel();
            return;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            self.shutdown.cancel();
            return;
        };
        let queue = Arc::clone(&self.queue);
        let timed_out = runtime
            .block_on(async { tokio::time::timeout(self.exit_timeout, queue.join()).await })
            .is_err();
        if timed_out {
            tracing::warn!("flush timed out with events still in flight");
        }
        self.shutdown.cancel();
    }

    /// Poll until both the ring and the writeback buffer are empty.
    pub fn wait_until_empty(&self) {
        while !self.queue.empty() {
            std::thread::sleep(EMPTY_POLL);
        }
    }

    pub fn fill_percentage(&self) -> f64 {
        self.queue.fill_percentage()
    }
}

impl Drop for Processor {
    fn drop(&mut self) {
        self.flush();
        if let Some(runtime) = self.runtime.take() {
            if tokio::runtime::Handle::try_current().is_ok() {
                // Dropping a runtime inside another runtime is not allowed;
                // hand the teardown to a background thread instead.
                runtime.shutdown_background();
            } else {
                drop(runtime);
            }
        }
    }
}

async fn worker_loop(index: usize, ctx: WorkerCtx) {
    // One HTTP session per worker, dropped when the worker exits.
    let client = reqwest::Client::new();
    tracing::debug!(worker = index, "worker started");

    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            item = ctx.queue.get(GET_TIMEOUT) => {
                match item {
                    Some(event) => process_event(&client, &ctx, event).await,
                    None => tokio::time::sleep(IDLE_SLEEP).await,
                }
            }
        }
    }

    tracing::debug!(worker = index, "worker stopped");
}

async fn process_event(client: &reqwest::Client, ctx: &WorkerCtx, event: Event) {
    if ctx.health.is_up(&ctx.server_host, false) {
        send_to_primary(client, ctx, event).await;
    } else if ctx.echopost_disable || ctx.sidecar.is_disabled() {
        if ctx.health.is_up(&ctx.fallback_server_host, true) {
            send_to_fallback(client, ctx, event).await;
        } else {
            ctx.queue.writeback_batch(vec![event]);
            tokio::time::sleep(BACKOFF_SLEEP).await;
        }
    } else {
        send_to_sidecar(ctx, event).await;
    }
}

/// One try per event against the primary. Requeue on transport failure,
/// drop on protocol failure.
async fn send_to_primary(client: &reqwest::Client, ctx: &WorkerCtx, event: Event) {
    let status = primary::send(client, &ctx.server_host, &event, &ctx.api_key).await;

    if status.success {
        ctx.queue.task_done();
        return;
    }

    if status.is_unavailable {
        ctx.queue.writeback_batch(vec![event]);
        ctx.health.mark_down(
            &ctx.server_host,
            false,
            Arc::new(HttpLivenessProbe::new(&ctx.server_host)),
        );
        tracing::warn!(server = %ctx.server_host, "primary server unavailable, requeued");
        return;
    }

    match store_dropped_events(&ctx.datanadhi_dir, std::slice::from_ref(&event), "primary_failed")
    {
        Ok(file) => tracing::error!(
            status_code = ?status.status_code,
            file = %file.display(),
            "primary send failed, data dropped"
        ),
        Err(e) => {
            tracing::error!(error = %e, "primary send failed and dropped store write failed")
        }
    }
    ctx.queue.task_done();
}

/// One try per batch against the fallback: the triggering event plus up to
/// 99 more pulled from the queue.
async fn send_to_fallback(client: &reqwest::Client, ctx: &WorkerCtx, event: Event) {
    let mut items = vec![event];
    items.extend(ctx.queue.get_batch(BATCH_SIZE - 1));

    let status = fallback::send(client, &ctx.fallback_server_host, &items, &ctx.api_key).await;

    if status.success {
        for _ in &items {
            ctx.queue.task_done();
        }
        return;
    }

    if status.is_unavailable {
        let batch_size = items.len();
        ctx.queue.writeback_batch(items);
        ctx.health.mark_down(
            &ctx.fallback_server_host,
            true,
            Arc::new(HttpLivenessProbe::new(&ctx.fallback_server_host)),
        );
        tracing::warn!(
            server = %ctx.fallback_server_host,
            batch_size,
            "fallback server unavailable, requeued"
        );
        return;
    }

    let batch_size = items.len();
    match store_dropped_events(&ctx.datanadhi_dir, &items, "fallback_failed") {
        Ok(file) => tracing::error!(
            status_code = ?status.status_code,
            batch_size,
            file = %file.display(),
            "fallback send failed, data dropped"
        ),
        Err(e) => {
            tracing::error!(error = %e, batch_size, "fallback send failed and dropped store write failed")
        }
    }
    for _ in 0..batch_size {
        ctx.queue.task_done();
    }
}

/// One try via the sidecar. Any failure trips the process-wide latch and
/// requeues the event; from then on every event skips the sidecar.
async fn send_to_sidecar(ctx: &WorkerCtx, event: Event) {
    if !ctx.sidecar.start_if_socket_not_exists().await {
        ctx.sidecar.disable();
        ctx.queue.writeback_batch(vec![event]);
        return;
    }

    if ctx.sidecar.send(&event.pipelines, &event.payload).await {
        ctx.queue.task_done();
    } else {
        ctx.sidecar.disable();
        tracing::error!("echopost send failed, requeued");
        ctx.queue.writeback_batch(vec![event]);
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
