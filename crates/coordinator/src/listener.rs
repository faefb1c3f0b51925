// SPDX-License-Identifier: MIT

//! TCP accept loop for the inbound RPC surface: one task per connection,
//! one request/response pair framed per [`cc_wire::framing`].

use std::net::SocketAddr;
use std::sync::Arc;

use cc_core::Clock;
use cc_wire::{CoordinatorResponse, ProtocolError};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::Coordinator;
use crate::error::RuntimeError;

/// Upper bound on how many successive ports a port-search will try before
/// giving up, so a misconfigured deployment fails fast instead of climbing
/// the entire ephemeral range.
const PORT_SEARCH_ATTEMPTS: u16 = 100;

pub struct Listener<C: Clock> {
    coordinator: Coordinator<C>,
    rpc_timeout: std::time::Duration,
    max_message_bytes: usize,
    port_search: bool,
}

impl<C: Clock> Listener<C> {
    pub fn new(coordinator: Coordinator<C>, rpc_timeout: std::time::Duration) -> Self {
        Self::with_max_message_bytes(coordinator, rpc_timeout, cc_wire::DEFAULT_MAX_MESSAGE_BYTES)
    }

    pub fn with_max_message_bytes(
        coordinator: Coordinator<C>,
        rpc_timeout: std::time::Duration,
        max_message_bytes: usize,
    ) -> Self {
        Self { coordinator, rpc_timeout, max_message_bytes, port_search: false }
    }

    /// If `addr`'s port is taken, try the next `PORT_SEARCH_ATTEMPTS` ports in
    /// sequence instead of failing outright. Mirrors the `port-search` config
    /// flag (§6): off by default, since a coordinator landing on an
    /// unexpected port needs the cluster lock path to still reflect reality.
    pub fn with_port_search(mut self, enabled: bool) -> Self {
        self.port_search = enabled;
        self
    }

    /// Bind `addr` (or a nearby port, if port-search is enabled) and accept
    /// connections until `cancel` fires.
    pub async fn run(self, addr: SocketAddr, cancel: CancellationToken) -> Result<(), RuntimeError> {
        let listener = self.bind(addr).await?;
        let addr = listener.local_addr().map_err(RuntimeError::Io)?;
        info!(%addr, "coordinator listening");
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted.map_err(RuntimeError::Io)?;
                    let coordinator = self.coordinator.clone();
                    let rpc_timeout = self.rpc_timeout;
                    let max_message_bytes = self.max_message_bytes;
                    let conn_cancel = cancel.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, &coordinator, rpc_timeout, max_message_bytes, conn_cancel)
                                .await
                        {
                            log_connection_error(peer, &e);
                        }
                    });
                }
                _ = cancel.cancelled() => {
                    info!("listener shutting down");
                    return Ok(());
                }
            }
        }
    }

    async fn bind(&self, addr: SocketAddr) -> Result<TcpListener, RuntimeError> {
        if !self.port_search {
            return TcpListener::bind(addr).await.map_err(|e| RuntimeError::BindFailed(addr, e));
        }
        let mut last_err = None;
        for offset in 0..PORT_SEARCH_ATTEMPTS {
            let candidate = SocketAddr::new(addr.ip(), addr.port().saturating_add(offset));
            match TcpListener::bind(candidate).await {
                Ok(listener) => {
                    if offset > 0 {
                        warn!(requested = %addr, bound = %candidate, "requested port busy; bound nearby port");
                    }
                    return Ok(listener);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => last_err = Some(e),
                Err(e) => return Err(RuntimeError::BindFailed(candidate, e)),
            }
        }
        Err(RuntimeError::BindFailed(
            addr,
            last_err.unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::AddrInUse, "port search exhausted")),
        ))
    }
}

/// Serve requests on one connection until the peer disconnects, a framing
/// error occurs, or `cancel` fires — whichever comes first. Modeled on the
/// same "race the read against shutdown" shape used for foreground
/// connection handling elsewhere in the stack, generalized from a Unix
/// socket to a plain TCP stream.
async fn handle_connection(
    mut stream: TcpStream,
    coordinator: &Coordinator<impl Clock>,
    rpc_timeout: std::time::Duration,
    max_message_bytes: usize,
    cancel: CancellationToken,
) -> Result<(), ProtocolError> {
    loop {
        let request = tokio::select! {
            request = cc_wire::read_message_timeout_with_limit(&mut stream, rpc_timeout, max_message_bytes) => request,
            _ = cancel.cancelled() => return Ok(()),
        };
        let payload = match request {
            Ok(payload) => payload,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        let request = cc_wire::decode(&payload)?;
        debug!(?request, "handling request");
        let response = coordinator.handle(request).await;
        cc_wire::write_response(&mut stream, &response).await?;
    }
}

fn log_connection_error(peer: SocketAddr, err: &ProtocolError) {
    match err {
        ProtocolError::ConnectionClosed | ProtocolError::Timeout => {
            debug!(%peer, error = %err, "connection ended");
        }
        _ => warn!(%peer, error = %err, "connection ended with an error"),
    }
}
