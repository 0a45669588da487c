// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from encoding, decoding, or framing wire traffic.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encode error: {0}")]
    Msgpack(#[from] rmp_serde::encode::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Empty frame")]
    EmptyFrame,

    #[error("No duration in metrics")]
    MissingDuration,

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

impl ProtocolError {
    /// True when the peer closed the stream.
    pub fn is_closed(&self) -> bool {
        match self {
            ProtocolError::ConnectionClosed => true,
            ProtocolError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
