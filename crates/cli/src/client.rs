// SPDX-License-Identifier: MIT

//! A direct-connect client to the coordinator's RPC listener: connect, send
//! one [`CoordinatorRequest`], read the framed [`CoordinatorResponse`], close.
//! Mirrors the coordinator's own `rpc_client` module — `ccctl` is just
//! another peer on the same wire protocol, so it gets no special helper
//! crate of its own.

use std::net::SocketAddr;
use std::time::Duration;

use cc_wire::{CoordinatorRequest, CoordinatorResponse};
use thiserror::Error;
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach coordinator at {addr}: {source}")]
    Connect { addr: SocketAddr, #[source] source: std::io::Error },

    #[error(transparent)]
    Protocol(#[from] cc_wire::ProtocolError),

    #[error("coordinator reported an error: {0}")]
    Rejected(String),
}

pub struct CoordinatorClient {
    addr: SocketAddr,
    timeout: Duration,
}

impl CoordinatorClient {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    /// Send one request and return its response.
    pub async fn send(&self, request: &CoordinatorRequest) -> Result<CoordinatorResponse, ClientError> {
        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| ClientError::Connect {
                addr: self.addr,
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            })?
            .map_err(|source| ClientError::Connect { addr: self.addr, source })?;

        cc_wire::write_response(&mut stream, request).await?;
        let payload = cc_wire::read_message_timeout(&mut stream, self.timeout).await?;
        Ok(cc_wire::decode(&payload)?)
    }

    /// Send `request`, rejecting any response other than the one `accept`
    /// recognizes. Most commands expect exactly one response shape back; this
    /// collapses the `Error`/unexpected-variant handling to one call site.
    pub async fn send_expecting<T>(
        &self,
        request: CoordinatorRequest,
        accept: impl FnOnce(CoordinatorResponse) -> Option<T>,
    ) -> Result<T, ClientError> {
        let response = self.send(&request).await?;
        let description = format!("{response:?}");
        if let CoordinatorResponse::Error { message } = &response {
            return Err(ClientError::Rejected(message.clone()));
        }
        accept(response).ok_or(ClientError::Rejected(format!("unexpected response: {description}")))
    }
}
