// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! The typed settings record handed to the rest of the SDK.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dn_core::paths::resolved_config_path;

use crate::builder::ConfigBuilder;
use crate::API_KEY_ENV;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not provided via DATANADHI_API_KEY env")]
    MissingApiKey,
}

/// Caller-supplied overrides, applied after cache/build resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Force the sidecar off for this process.
    pub echopost_disable: bool,
    /// Override the internal-diagnostic log level.
    pub log_level: Option<String>,
}

/// The resolved configuration record.
///
/// Serialized form is the `.config.resolved.json` cache; the API key is
/// deliberately excluded from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedConfig {
    /// Primary ingestion service, trailing slash stripped.
    pub server_host: String,
    /// Batch fallback service, trailing slash stripped.
    pub fallback_server_host: String,
    #[serde(skip)]
    pub api_key: String,
    pub async_queue_size: usize,
    pub async_workers: usize,
    pub async_exit_timeout_secs: u64,
    pub echopost_disable: bool,
    pub log_level: String,
}

impl ResolvedConfig {
    /// Load the resolved record: cache when present, otherwise a fresh build
    /// (which writes the cache). The API key always comes from the
    /// environment and its absence is the one fatal construction error.
    pub fn load(datanadhi_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_with(datanadhi_dir, &ConfigOverrides::default())
    }

    pub fn load_with(
        datanadhi_dir: &Path,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_or_build(datanadhi_dir);

        config.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        if overrides.echopost_disable {
            config.echopost_disable = true;
        }
        if let Some(level) = &overrides.log_level {
            config.log_level = level.clone();
        }

        Ok(config)
    }

    fn load_or_build(datanadhi_dir: &Path) -> Self {
        let cache = resolved_config_path(datanadhi_dir);
        if cache.exists() {
            match std::fs::read(&cache).map_err(|e| e.to_string()).and_then(|bytes| {
                serde_json::from_slice::<Self>(&bytes).map_err(|e| e.to_string())
            }) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %cache.display(), error = %e, "config cache unreadable, rebuilding");
                }
            }
        }
        ConfigBuilder::new(datanadhi_dir).build()
    }

    pub fn exit_timeout(&self) -> Duration {
        Duration::from_secs(self.async_exit_timeout_secs)
    }
}

#[cfg(test)]
#[path = "resolved_tests.rs"]
mod tests;
