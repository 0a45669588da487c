// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control socket codec: one JSON control message per line.

use nrpc_core::ControlMessage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::ProtocolError;

/// Read exactly one control message.
///
/// Returns [`ProtocolError::ConnectionClosed`] at EOF so callers can tell a
/// closed peer from a malformed line.
pub async fn read_control_message<R>(reader: &mut R) -> Result<ControlMessage, ProtocolError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).await?;
    if n == 0 {
        return Err(ProtocolError::ConnectionClosed);
    }
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }
    Ok(serde_json::from_slice(trimmed)?)
}

/// Write one control message as a newline-terminated JSON document.
pub async fn write_control_message<W>(
    writer: &mut W,
    message: &ControlMessage,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = serde_json::to_vec(message)?;
    buf.push(b'\n');
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
