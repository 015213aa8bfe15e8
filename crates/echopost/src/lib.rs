// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! EchoPost sidecar management: download the agent binary, spawn it
//! detached, wait for its UNIX socket, and deliver events over the wire
//! protocol — one unary `SendLog` call per event.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod download;
mod lifecycle;
mod rpc;

pub use download::{download_url, DownloadError};
pub use lifecycle::Sidecar;
