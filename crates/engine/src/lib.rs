// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! The asynchronous delivery engine.
//!
//! One [`Processor`] per `.datanadhi` directory owns a bounded [`SafeQueue`],
//! a pool of worker tasks, a [`HealthMonitor`] that gates routing, and an
//! emergency drain worker that bleeds the queue to the fallback service
//! under backpressure. Process-global state (the processor map and the
//! sidecar disable latch) lives in an explicit [`ProcessState`] value.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod drain;
mod health;
mod processor;
mod queue;
mod state;

pub use health::{HealthMonitor, HealthProbe, HttpLivenessProbe};
pub use processor::Processor;
pub use queue::SafeQueue;
pub use state::ProcessState;
