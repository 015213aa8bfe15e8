// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! The `SendLog` unary call over the agent's UNIX socket.

use std::time::Duration;

use tokio::net::UnixStream;

use dn_core::paths::socket_path;
use dn_wire::{read_reply, write_request, LogRequest, ProtocolError};

use crate::lifecycle::Sidecar;

const RPC_TIMEOUT: Duration = Duration::from_secs(5);

impl Sidecar {
    /// Deliver one event to the agent. Any connect, frame or decode problem
    /// counts as failure; the caller decides what failure means.
    pub async fn send(&self, pipelines: &[String], payload: &serde_json::Value) -> bool {
        match self.send_inner(pipelines, payload).await {
            Ok(success) => success,
            Err(e) => {
                tracing::debug!(error = %e, "sidecar send failed");
                false
            }
        }
    }

    async fn send_inner(
        &self,
        pipelines: &[String],
        payload: &serde_json::Value,
    ) -> Result<bool, ProtocolError> {
        let socket = socket_path(&self.datanadhi_dir);
        let mut stream = tokio::time::timeout(RPC_TIMEOUT, UnixStream::connect(&socket))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let request = LogRequest {
            json_data: serde_json::to_string(payload)?,
            pipelines: pipelines.to_vec(),
            api_key: self.api_key.clone(),
        };

        let (mut reader, mut writer) = stream.split();
        write_request(&mut writer, &request, RPC_TIMEOUT).await?;
        let reply = read_reply(&mut reader, RPC_TIMEOUT).await?;
        Ok(reply.success)
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
