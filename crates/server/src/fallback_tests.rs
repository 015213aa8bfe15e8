// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

use super::*;
use std::io::Read;

use flate2::read::GzDecoder;
use serde_json::json;

fn batch() -> Vec<Event> {
    vec![
        Event::new(vec!["p1".to_string()], json!({"message": "first"})),
        Event::new(vec!["p1".to_string(), "p2".to_string()], json!({"message": "second"})),
        Event::new(vec![], json!({"message": "third", "n": 3})),
    ]
}

#[test]
fn gzip_jsonl_decodes_back_to_the_same_batch_in_order() {
    let events = batch();
    let compressed = encode_jsonl_gz(&events).expect("encode failed");

    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut text = String::new();
    decoder.read_to_string(&mut text).expect("decode failed");

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), events.len());
    for (line, event) in lines.iter().zip(&events) {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value, event.to_body());
    }
}

#[test]
fn no_trailing_content_after_last_line() {
    let compressed = encode_jsonl_gz(&batch()).unwrap();

    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut text = String::new();
    decoder.read_to_string(&mut text).unwrap();

    assert!(text.ends_with('\n'));
    assert!(!text.ends_with("\n\n"));
}

#[test]
fn empty_batch_encodes_to_empty_stream() {
    let compressed = encode_jsonl_gz(&[]).unwrap();

    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut text = String::new();
    decoder.read_to_string(&mut text).unwrap();
    assert!(text.is_empty());
}
