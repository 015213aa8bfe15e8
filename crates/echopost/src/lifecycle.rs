// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Per-directory sidecar lifecycle: ensure the binary, spawn it detached,
//! wait for the socket.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use dn_core::paths::{binary_path, echopost_dir, socket_path};

use crate::download::{fetch_binary, DownloadError};

const SOCKET_WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to the sidecar agent for one `.datanadhi` directory.
///
/// The disable latch is shared process state: once tripped (by a download
/// network error, a failed start, or a failed send) it stays set for the
/// life of the process and every event skips the sidecar.
pub struct Sidecar {
    pub(crate) datanadhi_dir: PathBuf,
    pub(crate) api_key: String,
    health_url: String,
    /// Serializes racing starts within this process.
    start_lock: tokio::sync::Mutex<()>,
    disabled: Arc<AtomicBool>,
}

impl Sidecar {
    pub fn new(
        datanadhi_dir: impl Into<PathBuf>,
        api_key: impl Into<String>,
        health_url: impl Into<String>,
        disabled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            datanadhi_dir: datanadhi_dir.into(),
            api_key: api_key.into(),
            health_url: health_url.into(),
            start_lock: tokio::sync::Mutex::new(()),
            disabled,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Trip the process-wide disable latch. Set-only, never cleared.
    pub fn disable(&self) {
        if !self.disabled.swap(true, Ordering::Relaxed) {
            tracing::warn!("sidecar disabled for the rest of the process");
        }
    }

    /// Make sure the binary is on disk, downloading it if needed.
    ///
    /// Network-shaped failures trip the disable latch; an HTTP error or an
    /// unsupported platform leaves it alone.
    pub async fn ensure_binary(&self) -> Result<(), DownloadError> {
        let binary = binary_path(&self.datanadhi_dir);
        if binary.exists() {
            return Ok(());
        }
        match fetch_binary(&binary).await {
            Ok(()) => {
                tracing::debug!(path = %binary.display(), "echopost binary installed");
                Ok(())
            }
            Err(e) => {
                if e.disables_sidecar() {
                    self.disable();
                }
                Err(e)
            }
        }
    }

    /// Start the agent if its socket is absent, then wait for the socket to
    /// appear. Returns true iff the socket exists on return.
    pub async fn start_if_socket_not_exists(&self) -> bool {
        let socket = socket_path(&self.datanadhi_dir);
        if socket.exists() {
            return true;
        }

        {
            let _guard = self.start_lock.lock().await;
            if !socket.exists() && !self.start_detached() {
                return false;
            }
        }

        self.wait_for_socket().await
    }

    /// Spawn the binary as a detached background process: null stdio, own
    /// process group, so it survives the host application's exit.
    fn start_detached(&self) -> bool {
        let binary = binary_path(&self.datanadhi_dir);
        if !binary.exists() {
            return false;
        }

        let socket = socket_path(&self.datanadhi_dir);
        if socket.exists() {
            // Stale socket from a dead agent; the new one re-binds it.
            let _ = std::fs::remove_file(&socket);
        }

        let mut command = Command::new(&binary);
        command
            .arg("-datanadhi")
            .arg(echopost_dir(&self.datanadhi_dir))
            .arg("-api-key")
            .arg(&self.api_key)
            .arg("-health-url")
            .arg(&self.health_url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        match command.spawn() {
            Ok(child) => {
                tracing::debug!(pid = child.id(), "echopost agent spawned");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn echopost agent");
                false
            }
        }
    }

    /// Poll for the socket file at 50 ms intervals for up to 2 seconds.
    async fn wait_for_socket(&self) -> bool {
        let socket = socket_path(&self.datanadhi_dir);
        let deadline = Instant::now() + SOCKET_WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if socket.exists() {
                return true;
            }
            tokio::time::sleep(SOCKET_POLL_INTERVAL).await;
        }
        socket.exists()
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
