// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Configuration resolution for the Data Nadhi SDK.
//!
//! Settings come from `config.yml`/`config.yaml` dotted keys, then
//! environment overrides, then defaults, and the resolved record is cached
//! as `.config.resolved.json`. The API key is read from the environment on
//! every load and is never written to disk.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod builder;
mod resolved;

pub use builder::ConfigBuilder;
pub use resolved::{ConfigError, ConfigOverrides, ResolvedConfig};

/// Env var holding the API key. Absence is fatal at construction.
pub const API_KEY_ENV: &str = "DATANADHI_API_KEY";
/// Env override for the primary server host.
pub const SERVER_HOST_ENV: &str = "DATANADHI_SERVER_HOST";
/// Env override for the fallback server host.
pub const FALLBACK_SERVER_HOST_ENV: &str = "DATANADHI_FALLBACK_SERVER_HOST";
