// SPDX-License-Identifier: MIT

//! Tablet server identity.

use std::fmt;

/// Opaque identity of a live tablet server session.
///
/// Equality is by host, port, and session token together: a tablet server
/// that restarts on the same host:port gets a new token and is a different
/// [`TabletServerId`] as far as the coordinator is concerned, which is what
/// lets [`crate::job_index::JobIndex`] and [`crate::running_table::RunningTable`]
/// tell "the old process that just died" apart from "the new process that
/// just started" even though they share a network address.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct TabletServerId {
    pub host: String,
    pub port: u16,
    pub session_token: String,
}

impl TabletServerId {
    pub fn new(host: impl Into<String>, port: u16, session_token: impl Into<String>) -> Self {
        Self { host: host.into(), port, session_token: session_token.into() }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for TabletServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.host, self.port, short_token(&self.session_token))
    }
}

fn short_token(token: &str) -> &str {
    let end = token.len().min(8);
    &token[..end]
}
