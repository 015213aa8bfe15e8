// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Explicit process-global state: the processor-per-directory map and the
//! sidecar disable latch.
//!
//! Constructed once at program start by the façade and threaded through, so
//! multiple façades in the same process share one queue per directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

use dn_config::ResolvedConfig;

use crate::processor::Processor;

#[derive(Default)]
pub struct ProcessState {
    /// Construction mutex: at most one processor per absolute directory.
    processors: Mutex<HashMap<PathBuf, Arc<Processor>>>,
    /// Write-once: a tripped sidecar stays off for the life of the process.
    sidecar_disabled: Arc<AtomicBool>,
}

impl std::fmt::Debug for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessState").finish_non_exhaustive()
    }
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide sidecar disable latch, shared with every sidecar
    /// handle built from this state.
    pub fn sidecar_latch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.sidecar_disabled)
    }

    /// Get or create the processor for a directory. Keyed by absolute path
    /// so façades created from different working directories coalesce.
    pub fn processor_for_directory(
        &self,
        datanadhi_dir: &Path,
        config: &ResolvedConfig,
    ) -> std::io::Result<Arc<Processor>> {
        let key = std::path::absolute(datanadhi_dir)
            .unwrap_or_else(|_| datanadhi_dir.to_path_buf());

        let mut processors = self.processors.lock();
        if let Some(processor) = processors.get(&key) {
            return Ok(Arc::clone(processor));
        }

        let processor =
            Arc::new(Processor::start(key.clone(), config, self.sidecar_latch())?);
        processors.insert(key, Arc::clone(&processor));
        Ok(processor)
    }

    /// Flush every processor this state has handed out.
    pub fn flush_all(&self) {
        let processors: Vec<Arc<Processor>> =
            self.processors.lock().values().cloned().collect();
        for processor in processors {
            processor.flush();
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
