// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! SDK entry point: resolve configuration and rules, start the delivery
//! engine, hand out loggers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use dn_config::{ConfigError, ConfigOverrides, ResolvedConfig};
use dn_engine::{ProcessState, Processor};
use dn_rules::{CompiledRules, RuleResolver};

use crate::level::Level;
use crate::logger::Logger;

/// Errors that can reach the caller at construction. Nothing after
/// construction does.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("delivery engine start failed: {0}")]
    Engine(#[from] std::io::Error),
}

#[derive(Debug)]
pub(crate) struct SdkShared {
    pub(crate) rules: CompiledRules,
    pub(crate) no_rules: bool,
    pub(crate) processor: Option<Arc<Processor>>,
    /// Stdout emission threshold, from the configured log level.
    pub(crate) stdout_level: Level,
    state: Arc<ProcessState>,
}

/// Handle to the SDK for one `.datanadhi` directory. Cheap to clone; all
/// clones share the same engine.
#[derive(Clone, Debug)]
pub struct Datanadhi {
    inner: Arc<SdkShared>,
}

impl Datanadhi {
    /// Initialize with defaults and a private [`ProcessState`].
    pub fn init(datanadhi_dir: impl AsRef<Path>) -> Result<Self, InitError> {
        Self::init_with(datanadhi_dir, ConfigOverrides::default())
    }

    /// Initialize with overrides and a private [`ProcessState`].
    pub fn init_with(
        datanadhi_dir: impl AsRef<Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, InitError> {
        Self::init_in(Arc::new(ProcessState::new()), datanadhi_dir, overrides)
    }

    /// Initialize against a shared [`ProcessState`], so multiple façades in
    /// one process coalesce onto one processor per directory.
    pub fn init_in(
        state: Arc<ProcessState>,
        datanadhi_dir: impl AsRef<Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, InitError> {
        let datanadhi_dir = absolute(datanadhi_dir.as_ref());
        let config = ResolvedConfig::load_with(&datanadhi_dir, &overrides)?;

        let table = RuleResolver::new(&datanadhi_dir).load();
        let no_rules = table.is_empty();
        let rules = CompiledRules::compile(&table);

        let processor = if no_rules {
            tracing::warn!(
                datanadhi_dir = %datanadhi_dir.display(),
                "no rules set, defaulting to stdout"
            );
            None
        } else {
            Some(state.processor_for_directory(&datanadhi_dir, &config)?)
        };

        let stdout_level = Level::parse(&config.log_level).unwrap_or(Level::Info);

        Ok(Self {
            inner: Arc::new(SdkShared { rules, no_rules, processor, stdout_level, state }),
        })
    }

    /// A logger bound to a module name. Clones share this SDK's engine.
    pub fn logger(&self, module_name: impl Into<String>) -> Logger {
        Logger::new(Arc::clone(&self.inner), module_name.into())
    }

    /// Drain queued events, bounded by the configured exit timeout per
    /// processor. Safe to call more than once.
    pub fn flush(&self) {
        self.inner.state.flush_all();
    }

    /// Block until every queued event has left the queue (no timeout).
    pub fn wait_until_empty(&self) {
        if let Some(processor) = &self.inner.processor {
            processor.wait_until_empty();
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
#[path = "sdk_tests.rs"]
mod tests;
