// SPDX-License-Identifier: MIT

//! Wire protocol for the coordinator: length-prefixed JSON framing plus the
//! inbound and outbound RPC envelopes. No networking beyond generic
//! `AsyncRead`/`AsyncWrite` — `cc-coordinator` supplies the TCP connections.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod framing;
mod outbound;
mod request;
mod response;

pub use framing::{
    decode, encode, read_message, read_message_timeout, read_message_timeout_with_limit,
    read_message_with_limit, read_request, write_message, write_response, ProtocolError,
    DEFAULT_MAX_MESSAGE_BYTES,
};
pub use outbound::{
    CompactorRequest, CompactorResponse, QueueSummary, TabletServerRequest, TabletServerResponse,
};
pub use request::CoordinatorRequest;
pub use response::{CoordinatorResponse, JobAssignment};
