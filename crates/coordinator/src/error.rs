// SPDX-License-Identifier: MIT

//! Coordinator-level error taxonomy (RPC transport, bootstrap, lock). The
//! per-entry `UnknownCompactionId` error lives in `cc_core::CoordinatorError`;
//! this enum covers everything around it.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to acquire leader lock: coordinator already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind listener at {0}: {1}")]
    BindFailed(SocketAddr, #[source] std::io::Error),

    #[error("rpc failed: {0}")]
    Rpc(#[from] cc_wire::ProtocolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Core(#[from] cc_core::CoordinatorError),

    #[error("retry budget exhausted after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<RuntimeError>,
    },

    #[error("retry loop exceeded its deadline")]
    Timeout,

    #[error("unexpected response variant: {0}")]
    UnexpectedResponse(String),
}
