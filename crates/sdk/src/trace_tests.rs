// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

use super::*;

#[test]
fn explicit_id_wins_and_becomes_current() {
    clear_trace_id();
    assert_eq!(resolve(Some("trace-a")), "trace-a");
    // sticks for the next call without an explicit id
    assert_eq!(resolve(None), "trace-a");
    clear_trace_id();
}

#[test]
fn minted_id_is_stable_until_cleared() {
    clear_trace_id();
    let first = resolve(None);
    let second = resolve(None);
    assert_eq!(first, second);

    clear_trace_id();
    let third = resolve(None);
    assert_ne!(first, third);
    clear_trace_id();
}

#[test]
fn ids_are_thread_local() {
    clear_trace_id();
    set_trace_id("main-thread");

    let other = std::thread::spawn(|| resolve(None)).join().unwrap();
    assert_ne!(other, "main-thread");

    assert_eq!(resolve(None), "main-thread");
    clear_trace_id();
}
