// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Thread-local trace id propagation.
//!
//! An explicit trace id on a log call wins and becomes the thread's current
//! id; otherwise the current id is reused; otherwise a fresh UUID is minted
//! and stored.

use std::cell::RefCell;

use uuid::Uuid;

thread_local! {
    static TRACE_ID: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Set the current thread's trace id.
pub fn set_trace_id(trace_id: impl Into<String>) {
    let trace_id = trace_id.into();
    TRACE_ID.with(|current| *current.borrow_mut() = Some(trace_id));
}

/// Clear the current thread's trace id; the next log call mints a new one.
pub fn clear_trace_id() {
    TRACE_ID.with(|current| *current.borrow_mut() = None);
}

/// Resolve the trace id for one log call.
pub(crate) fn resolve(explicit: Option<&str>) -> String {
    if let Some(explicit) = explicit {
        set_trace_id(explicit);
        return explicit.to_string();
    }
    TRACE_ID.with(|current| {
        let mut current = current.borrow_mut();
        match current.as_ref() {
            Some(id) => id.clone(),
            None => {
                let id = Uuid::new_v4().to_string();
                *current = Some(id.clone());
                id
            }
        }
    })
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
