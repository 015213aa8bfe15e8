// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Builds the resolved record from YAML, environment and defaults.

use std::path::{Path, PathBuf};

use dn_core::paths::resolved_config_path;

use crate::resolved::ResolvedConfig;
use crate::{FALLBACK_SERVER_HOST_ENV, SERVER_HOST_ENV};

const DEFAULT_SERVER_HOST: &str = "http://data-nadhi-server:5000";
const DEFAULT_FALLBACK_SERVER_HOST: &str = "http://data-nadhi-fallback:5000";
const DEFAULT_QUEUE_SIZE: usize = 1000;
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_EXIT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Resolves each setting as YAML dotted key → env override → default, and
/// writes the result to `.config.resolved.json`.
pub struct ConfigBuilder {
    datanadhi_dir: PathBuf,
    yaml: serde_yaml::Value,
}

impl ConfigBuilder {
    pub fn new(datanadhi_dir: impl Into<PathBuf>) -> Self {
        let datanadhi_dir = datanadhi_dir.into();
        let yaml = load_yaml(&datanadhi_dir);
        Self { datanadhi_dir, yaml }
    }

    pub fn build(&self) -> ResolvedConfig {
        let config = ResolvedConfig {
            server_host: strip_trailing_slash(self.host(
                "server.server_host",
                SERVER_HOST_ENV,
                DEFAULT_SERVER_HOST,
            )),
            fallback_server_host: strip_trailing_slash(self.host(
                "server.fallback_server_host",
                FALLBACK_SERVER_HOST_ENV,
                DEFAULT_FALLBACK_SERVER_HOST,
            )),
            api_key: String::new(),
            async_queue_size: self.unsigned("async.queue_size", DEFAULT_QUEUE_SIZE as u64)
                as usize,
            async_workers: self.unsigned("async.workers", DEFAULT_WORKERS as u64) as usize,
            async_exit_timeout_secs: self
                .unsigned("async.exit_timeout", DEFAULT_EXIT_TIMEOUT_SECS),
            echopost_disable: self.flag("echopost.disable"),
            log_level: self
                .string("log.level")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };
        self.write_cache(&config);
        config
    }

    /// YAML value first, then the env override, then the default.
    fn host(&self, dotted: &str, env: &str, default: &str) -> String {
        self.string(dotted)
            .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| default.to_string())
    }

    fn string(&self, dotted: &str) -> Option<String> {
        self.lookup(dotted)?.as_str().map(str::to_string)
    }

    fn unsigned(&self, dotted: &str, default: u64) -> u64 {
        match self.lookup(dotted) {
            None => default,
            Some(value) => match value.as_u64() {
                Some(n) => n,
                None => {
                    tracing::warn!(key = dotted, "ignoring non-integer config value");
                    default
                }
            },
        }
    }

    fn flag(&self, dotted: &str) -> bool {
        self.lookup(dotted).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn lookup(&self, dotted: &str) -> Option<&serde_yaml::Value> {
        let mut current = &self.yaml;
        for segment in dotted.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }

    fn write_cache(&self, config: &ResolvedConfig) {
        let path = resolved_config_path(&self.datanadhi_dir);
        let result = serde_json::to_vec(config)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to write config cache");
        }
    }
}

fn load_yaml(datanadhi_dir: &Path) -> serde_yaml::Value {
    for name in ["config.yml", "config.yaml"] {
        let path = datanadhi_dir.join(name);
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_yaml::from_str(&text).map_err(|e| e.to_string()))
        {
            Ok(value) => return value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            }
        }
    }
    serde_yaml::Value::Null
}

fn strip_trailing_slash(host: String) -> String {
    host.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
