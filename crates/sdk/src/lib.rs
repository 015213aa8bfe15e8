// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Data Nadhi client SDK.
//!
//! [`Datanadhi::init`] resolves configuration and rules for a `.datanadhi`
//! directory and starts the delivery engine; [`Logger`] evaluates each log
//! call against the compiled rules, writes matching events to stdout, and
//! hands matched pipelines to the asynchronous processor. Delivery failures
//! never reach the calling application.
//!
//! ```no_run
//! use datanadhi::Datanadhi;
//!
//! let sdk = Datanadhi::init(".datanadhi")?;
//! let log = sdk.logger("billing");
//! log.error("charge failed", serde_json::json!({"user": {"id": "42"}}), None);
//! sdk.flush();
//! # Ok::<(), datanadhi::InitError>(())
//! ```

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod level;
mod logger;
mod payload;
mod sdk;
mod trace;

pub use dn_config::ConfigOverrides;
pub use level::Level;
pub use logger::Logger;
pub use sdk::{Datanadhi, InitError};
pub use trace::{clear_trace_id, set_trace_id};
