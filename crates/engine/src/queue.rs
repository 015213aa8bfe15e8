// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Bounded queue with writeback buffer and task accounting.
//!
//! The ring is strictly bounded; the writeback buffer is unbounded by
//! design, so a sustained backend outage shows up as `fill_percentage()`
//! climbing past 1.0 rather than as lost events. The writeback guard is
//! never held across a blocking operation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use dn_core::Event;

/// Thread-safe bounded queue with batch operations and overflow handling.
pub struct SafeQueue {
    capacity: usize,
    ring: Mutex<VecDeque<Event>>,
    /// Failed sends waiting for ring space. FIFO, unbounded.
    writeback: Mutex<VecDeque<Event>>,
    /// Events accepted and not yet acknowledged via [`SafeQueue::task_done`].
    /// A writeback does not re-count: the event is still the same unit of
    /// outstanding work.
    outstanding: AtomicUsize,
    items: Notify,
    done: Notify,
}

impl SafeQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            writeback: Mutex::new(VecDeque::new()),
            outstanding: AtomicUsize::new(0),
            items: Notify::new(),
            done: Notify::new(),
        }
    }

    /// Non-blocking enqueue. Returns false iff the ring is at capacity; the
    /// writeback buffer is never offered ring slots here.
    pub fn add(&self, event: Event) -> bool {
        {
            let mut ring = self.ring.lock();
            if ring.len() >= self.capacity {
                return false;
            }
            ring.push_back(event);
        }
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.items.notify_one();
        true
    }

    /// Block up to `timeout` for one item. Opportunistically migrates
    /// writeback items back into the ring; if the first wait came up empty
    /// and the migration produced work, one more wait is attempted.
    pub async fn get(&self, timeout: Duration) -> Option<Event> {
        let item = self.pop_wait(timeout).await;
        let drained = self.drain_writeback();
        if item.is_none() && drained > 0 {
            return self.pop_wait(timeout).await;
        }
        item
    }

    async fn pop_wait(&self, timeout: Duration) -> Option<Event> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before checking so a notify landing between
            // the check and the await is not lost.
            let notified = self.items.notified();
            if let Some(event) = self.try_pop() {
                return Some(event);
            }
            match tokio::time::timeout_at(deadline, notified).await {
                Ok(()) => continue,
                Err(_) => return self.try_pop(),
            }
        }
    }

    fn try_pop(&self) -> Option<Event> {
        self.ring.lock().pop_front()
    }

    /// Non-blocking: up to `n` items from the ring.
    pub fn get_batch(&self, n: usize) -> Vec<Event> {
        let mut ring = self.ring.lock();
        let take = n.min(ring.len());
        ring.drain(..take).collect()
    }

    /// Return failed items to the queue: pre-existing writeback items are
    /// re-injected first (FIFO), then the new items; whatever does not fit
    /// in the ring goes to the writeback buffer. Returns the count that
    /// reached the ring.
    pub fn writeback_batch(&self, items: Vec<Event>) -> usize {
        let mut written = self.drain_writeback();

        let mut writeback = self.writeback.lock();
        let mut notify = 0;
        for event in items {
            // Only bypass the buffer when it is empty, so older failures
            // keep their place in line.
            if writeback.is_empty() {
                let mut ring = self.ring.lock();
                if ring.len() < self.capacity {
                    ring.push_back(event);
                    written += 1;
                    notify += 1;
                    continue;
                }
            }
            writeback.push_back(event);
        }
        drop(writeback);

        for _ in 0..notify {
            self.items.notify_one();
        }
        written
    }

    /// Move writeback items into ring slots while both allow it.
    fn drain_writeback(&self) -> usize {
        let mut moved = 0;
        {
            let mut writeback = self.writeback.lock();
            while !writeback.is_empty() {
                let mut ring = self.ring.lock();
                if ring.len() >= self.capacity {
                    break;
                }
                if let Some(event) = writeback.pop_front() {
                    ring.push_back(event);
                    moved += 1;
                }
            }
        }
        for _ in 0..moved {
            self.items.notify_one();
        }
        moved
    }

    /// Acknowledge one event. Exactly one call per accepted event, no matter
    /// which sink handled it.
    pub fn task_done(&self) {
        match self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(1) => self.done.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::warn!("task_done called with no outstanding tasks"),
        }
    }

    /// Block until every accepted event has been acknowledged.
    pub async fn join(&self) {
        loop {
            let notified = self.done.notified();
            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// `(ring + writeback) / capacity`. Exceeds 1.0 while the writeback
    /// buffer holds items.
    pub fn fill_percentage(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        let total = self.ring.lock().len() + self.writeback.lock().len();
        total as f64 / self.capacity as f64
    }

    /// True when both the ring and the writeback buffer are empty.
    pub fn empty(&self) -> bool {
        self.ring.lock().is_empty() && self.writeback.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
