// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Filesystem layout rooted at a `.datanadhi` directory.
//!
//! ```text
//! <dir>/config.yml | config.yaml      source config (external)
//! <dir>/rules/*.{yml,yaml}            rule files (external)
//! <dir>/.config.resolved.json         resolved config cache
//! <dir>/.rules.resolved.json          compiled rules cache
//! <dir>/echopost/echopost             sidecar binary
//! <dir>/echopost/data-nadhi-agent.sock  sidecar socket
//! <dir>/dropped/<reason>_<ms>.jsonl   dropped events
//! ```

use std::path::{Path, PathBuf};

pub fn echopost_dir(datanadhi_dir: &Path) -> PathBuf {
    datanadhi_dir.join("echopost")
}

pub fn binary_path(datanadhi_dir: &Path) -> PathBuf {
    echopost_dir(datanadhi_dir).join("echopost")
}

pub fn socket_path(datanadhi_dir: &Path) -> PathBuf {
    echopost_dir(datanadhi_dir).join("data-nadhi-agent.sock")
}

pub fn dropped_dir(datanadhi_dir: &Path) -> PathBuf {
    datanadhi_dir.join("dropped")
}

pub fn rules_dir(datanadhi_dir: &Path) -> PathBuf {
    datanadhi_dir.join("rules")
}

pub fn resolved_rules_path(datanadhi_dir: &Path) -> PathBuf {
    datanadhi_dir.join(".rules.resolved.json")
}

pub fn resolved_config_path(datanadhi_dir: &Path) -> PathBuf {
    datanadhi_dir.join(".config.resolved.json")
}
