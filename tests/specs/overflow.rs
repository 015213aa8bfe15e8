// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Backpressure specs: the 90 % watermark activates the drain path and the
//! queue bleeds to the fallback service without losing events.

use std::time::Duration;

use serde_json::json;
use serial_test::serial;

use datanadhi::Datanadhi;

use crate::prelude::*;

#[test]
#[serial]
fn high_watermark_drains_the_queue_to_the_fallback() {
    set_api_key();
    let primary = MockServer::start();
    primary.set_all(503);
    let fallback = MockServer::start();
    let dir = datanadhi_dir(&primary, &fallback, 10);
    write_user_rule(dir.path());

    let sdk = Datanadhi::init(dir.path()).unwrap();
    let log = sdk.logger("app");

    // Push to (and past) the 90 % watermark as fast as submission allows.
    let mut accepted = 0;
    for n in 0..9 {
        if log
            .error("burst", json!({"user": {"id": "42"}, "n": n}), None)
            .is_some()
        {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 9);

    assert!(fallback.wait_for("/upload", 1, Duration::from_secs(10)), "no drain to fallback");
    sdk.flush();

    // every accepted event reached the fallback exactly once, none dropped
    let events: Vec<serde_json::Value> = fallback
        .requests_for("/upload")
        .iter()
        .flat_map(|r| decode_upload(&r.body))
        .collect();
    let mut seen: Vec<u64> =
        events.iter().map(|e| e["log_data"]["context"]["n"].as_u64().unwrap()).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..9).collect::<Vec<u64>>());
    assert!(!dir.path().join("dropped").exists());
}
