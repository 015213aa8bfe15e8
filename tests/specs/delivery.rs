// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Delivery specs: routing, writeback, drops and recovery against live
//! (mock) primary and fallback services.

use std::time::Duration;

use serde_json::json;
use serial_test::serial;

use datanadhi::Datanadhi;

use crate::prelude::*;

fn wait(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

#[test]
#[serial]
fn matching_event_reaches_the_primary_service() {
    set_api_key();
    let primary = MockServer::start();
    let fallback = MockServer::start();
    let dir = datanadhi_dir(&primary, &fallback, 100);
    write_user_rule(dir.path());

    let sdk = Datanadhi::init(dir.path()).unwrap();
    let log = sdk.logger("app");

    let payload = log.error("boom", json!({"user": {"id": "42"}}), None).unwrap();
    assert_eq!(payload["context"]["user"]["id"], "42");

    assert!(primary.wait_for("/log", 1, wait(5)), "no POST /log arrived");
    sdk.flush();

    let requests = primary.requests_for("/log");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.headers.get("datanadhi_api_key").map(String::as_str), Some("spec-key"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["pipelines"], json!(["p1"]));
    assert_eq!(body["log_data"]["message"], "boom");
    assert_eq!(body["log_data"]["context"]["user"]["id"], "42");

    // nothing was dropped
    assert!(!dir.path().join("dropped").exists());
}

#[test]
#[serial]
fn non_matching_event_is_not_submitted() {
    set_api_key();
    let primary = MockServer::start();
    let fallback = MockServer::start();
    let dir = datanadhi_dir(&primary, &fallback, 100);
    write_user_rule(dir.path());

    let sdk = Datanadhi::init(dir.path()).unwrap();
    let log = sdk.logger("app");
    log.error("quiet", json!({"user": {"id": "7"}}), None);
    sdk.flush();

    assert!(primary.requests_for("/log").is_empty());
}

#[test]
#[serial]
fn protocol_failure_drops_the_event_exactly_once() {
    set_api_key();
    let primary = MockServer::start();
    primary.set_status("/log", 400);
    let fallback = MockServer::start();
    let dir = datanadhi_dir(&primary, &fallback, 100);
    write_user_rule(dir.path());

    let sdk = Datanadhi::init(dir.path()).unwrap();
    let log = sdk.logger("app");
    log.error("bad payload", json!({"user": {"id": "42"}}), None);

    let file = wait_for_dropped(dir.path(), "primary_failed", wait(5))
        .expect("no dropped file appeared");
    // flush returns promptly because the drop acknowledged the event
    let start = std::time::Instant::now();
    sdk.flush();
    assert!(start.elapsed() < wait(2));

    let content = std::fs::read_to_string(&file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["pipelines"], json!(["p1"]));
    assert_eq!(record["log_data"]["message"], "bad payload");

    // one try, no retry
    assert_eq!(primary.requests_for("/log").len(), 1);
}

#[test]
#[serial]
fn primary_outage_routes_a_gzipped_batch_to_the_fallback() {
    set_api_key();
    let primary = MockServer::start();
    primary.set_all(503);
    let fallback = MockServer::start();
    let dir = datanadhi_dir(&primary, &fallback, 100);
    write_user_rule(dir.path());

    let sdk = Datanadhi::init(dir.path()).unwrap();
    let log = sdk.logger("app");
    log.error("first", json!({"user": {"id": "42"}}), None);
    log.error("second", json!({"user": {"id": "42"}}), None);

    assert!(fallback.wait_for("/upload", 1, wait(10)), "no POST /upload arrived");
    sdk.flush();

    let uploads = fallback.requests_for("/upload");
    let request = &uploads[0];
    assert_eq!(
        request.headers.get("content-type").map(String::as_str),
        Some("application/octet-stream")
    );
    assert_eq!(request.headers.get("datanadhi_api_key").map(String::as_str), Some("spec-key"));

    // every submitted event is in some upload, in JSONL order
    let events: Vec<serde_json::Value> =
        uploads.iter().flat_map(|r| decode_upload(&r.body)).collect();
    let messages: Vec<&str> =
        events.iter().map(|e| e["log_data"]["message"].as_str().unwrap()).collect();
    assert!(messages.contains(&"first"));
    assert!(messages.contains(&"second"));

    // the primary took the 503 on the first event only, then was gated off
    assert!(primary.requests_for("/log").len() <= 2);
    assert!(!dir.path().join("dropped").exists());
}

#[test]
#[serial]
fn primary_recovery_restores_direct_delivery() {
    set_api_key();
    let primary = MockServer::start();
    primary.set_all(503);
    let fallback = MockServer::start();
    let dir = datanadhi_dir(&primary, &fallback, 100);
    write_user_rule(dir.path());

    let sdk = Datanadhi::init(dir.path()).unwrap();
    let log = sdk.logger("app");

    // first event trips the health gate and detours via the fallback
    log.error("detour", json!({"user": {"id": "42"}}), None);
    assert!(fallback.wait_for("/upload", 1, wait(10)));

    // primary comes back; the 500 ms probe clears the gate
    primary.set_all(200);
    std::thread::sleep(Duration::from_millis(1500));

    log.error("direct", json!({"user": {"id": "42"}}), None);
    assert!(primary.wait_for("/log", 2, wait(10)), "recovered primary saw no POST /log");
    sdk.flush();

    let direct = primary
        .requests_for("/log")
        .iter()
        .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
        .any(|body| body["log_data"]["message"] == "direct");
    assert!(direct, "event after recovery did not reach the primary");
}

#[test]
#[serial]
fn fallback_5xx_requeues_the_whole_batch_until_recovery() {
    set_api_key();
    let primary = MockServer::start();
    primary.set_all(503);
    let fallback = MockServer::start();
    fallback.set_all(503);
    let dir = datanadhi_dir(&primary, &fallback, 100);
    write_user_rule(dir.path());

    let sdk = Datanadhi::init(dir.path()).unwrap();
    let log = sdk.logger("app");
    log.error("survivor", json!({"user": {"id": "42"}}), None);

    // the batch bounced at least once
    assert!(fallback.wait_for("/upload", 1, wait(10)));
    assert!(wait_for_dropped(dir.path(), "fallback_failed", Duration::from_millis(500)).is_none());

    // fallback recovers; the requeued batch must land
    fallback.set_all(200);
    let deadline = std::time::Instant::now() + wait(15);
    let mut delivered = false;
    while std::time::Instant::now() < deadline {
        let delivered_now = fallback
            .requests_for("/upload")
            .iter()
            .flat_map(|r| decode_upload(&r.body))
            .any(|e| e["log_data"]["message"] == "survivor");
        if delivered_now {
            delivered = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(delivered, "requeued batch never reached the recovered fallback");
    sdk.flush();
}
