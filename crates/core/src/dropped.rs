// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Append-only store for events the delivery engine has chosen not to retry.
//!
//! Records land in `<dir>/dropped/<reason>_<ms>.jsonl`, one JSON object per
//! line. Nothing in the SDK ever reads these files back.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths::dropped_dir;
use crate::{epoch_ms, Event};

/// Errors from writing a dropped-events file.
#[derive(Debug, Error)]
pub enum DroppedStoreError {
    #[error("dropped store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("dropped record encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append `events` to a reason-stamped JSONL file under `<dir>/dropped/`.
///
/// Returns the file path relative to `datanadhi_dir` (for log context).
pub fn store_dropped_events(
    datanadhi_dir: &Path,
    events: &[Event],
    reason: &str,
) -> Result<PathBuf, DroppedStoreError> {
    let dir = dropped_dir(datanadhi_dir);
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{}_{}.jsonl", reason, epoch_ms()));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut writer = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut writer, &event.to_body())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(path.strip_prefix(datanadhi_dir).unwrap_or(&path).to_path_buf())
}

#[cfg(test)]
#[path = "dropped_tests.rs"]
mod tests;
