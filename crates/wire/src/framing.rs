// SPDX-License-Identifier: MIT

//! Length-prefixed JSON framing: 4-byte length prefix (big-endian) + JSON
//! payload. Shared by every RPC direction — compactor/tablet-server-facing
//! and coordinator-initiated alike — so there is exactly one wire format to
//! reason about.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message of {len} bytes exceeds the {max}-byte limit")]
    MessageTooLarge { len: usize, max: usize },

    #[error("connection closed before a full message was read")]
    ConnectionClosed,

    #[error("timed out waiting for a message")]
    Timeout,
}

/// Default cap on a single frame's payload size, overridable via
/// configuration. Chosen generously above any realistic job descriptor or
/// status batch.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Serialize `value` to its raw JSON payload, with no length prefix.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a raw JSON payload (no length prefix) into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write `payload` prefixed with its 4-byte big-endian length.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    if payload.len() > DEFAULT_MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge {
            len: payload.len(),
            max: DEFAULT_MAX_MESSAGE_BYTES,
        });
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame, returning its raw JSON payload, rejecting
/// anything over `max_bytes` before the read buffer is even allocated.
pub async fn read_message_with_limit<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_bytes {
        return Err(ProtocolError::MessageTooLarge { len, max: max_bytes });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// [`read_message_with_limit`] against [`DEFAULT_MAX_MESSAGE_BYTES`]. Kept
/// for call sites (mostly tests) with no configured cap of their own.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    read_message_with_limit(reader, DEFAULT_MAX_MESSAGE_BYTES).await
}

/// [`read_message_with_limit`] bounded by `timeout` — every outbound RPC
/// attempt inherits a transport timeout; this is that timeout applied to the
/// read half.
pub async fn read_message_timeout_with_limit<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
    max_bytes: usize,
) -> Result<Vec<u8>, ProtocolError> {
    tokio::time::timeout(timeout, read_message_with_limit(reader, max_bytes))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// [`read_message_timeout_with_limit`] against [`DEFAULT_MAX_MESSAGE_BYTES`].
pub async fn read_message_timeout<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Vec<u8>, ProtocolError> {
    read_message_timeout_with_limit(reader, timeout, DEFAULT_MAX_MESSAGE_BYTES).await
}

/// Read one frame and decode it as `T` in one step.
pub async fn read_request<R: AsyncRead + Unpin, T: DeserializeOwned>(
    reader: &mut R,
) -> Result<T, ProtocolError> {
    let payload = read_message(reader).await?;
    decode(&payload)
}

/// Encode `value` and write it as one frame.
pub async fn write_response<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    value: &T,
) -> Result<(), ProtocolError> {
    let payload = encode(value)?;
    write_message(writer, &payload).await
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
