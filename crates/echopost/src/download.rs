// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Fetching the EchoPost binary from the distribution endpoint.

use std::path::Path;

use thiserror::Error;

const DOWNLOAD_BASE: &str = "https://downloads.datanadhi.com/echopost";

/// Why the binary could not be made available.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("unsupported platform for EchoPost: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("download returned status {status}")]
    Http { status: u16 },

    #[error("download network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("binary install I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Network-shaped errors trip the process-wide sidecar disable latch;
    /// an HTTP error or unsupported platform does not.
    pub fn disables_sidecar(&self) -> bool {
        matches!(self, DownloadError::Network(_) | DownloadError::Io(_))
    }
}

/// Distribution URL for the current platform.
///
/// Only `{darwin,linux} x {amd64,arm64}` builds exist.
pub fn download_url() -> Result<String, DownloadError> {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        "linux" => "linux",
        other => {
            return Err(DownloadError::UnsupportedPlatform {
                os: other.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            })
        }
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => {
            return Err(DownloadError::UnsupportedPlatform {
                os: os.to_string(),
                arch: other.to_string(),
            })
        }
    };
    Ok(format!("{DOWNLOAD_BASE}/{os}/{arch}/echopost-latest"))
}

/// Download the binary to `path` and mark it executable (0755).
pub(crate) async fn fetch_binary(path: &Path) -> Result<(), DownloadError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let url = download_url()?;
    let response = reqwest::get(&url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Http { status: status.as_u16() });
    }
    let bytes = response.bytes().await?;

    std::fs::write(path, &bytes)?;
    set_executable(path)?;
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
