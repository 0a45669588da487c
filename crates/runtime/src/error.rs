// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use nrpc_core::{ResultError, RuntimeStatus, TransportError};
use nrpc_wire::ProtocolError;
use thiserror::Error;

/// Errors from runtime lifecycle and event dispatch.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime is not ready (status: {0})")]
    NotReady(RuntimeStatus),

    #[error("client disconnected")]
    ClientDisconnected,

    #[error("Runtime restarted")]
    Restarted,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Result(#[from] ResultError),

    #[error("no results received")]
    EmptyResults,

    #[error("failed to listen on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout { timeout: Duration, what: &'static str },

    #[error("failed to spawn wrapper: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("wrapper process exited: {0}")]
    WrapperExited(String),

    #[error("failed to signal wrapper: {0}")]
    Signal(#[from] nix::errno::Errno),

    #[error("wrapper does not support restart")]
    RestartUnsupported,

    #[error("unknown control message kind: {0}")]
    UnknownControlKind(String),

    #[error("no control connection")]
    NoControlConnection,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// HTTP-style status code a processor should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RuntimeError::Restarted | RuntimeError::Timeout { .. } => 408,
            RuntimeError::Result(e) => e.status_code(),
            RuntimeError::NotReady(_) => 503,
            _ => 500,
        }
    }

    /// Whether the same event may succeed if submitted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RuntimeError::NotReady(_)
                | RuntimeError::Restarted
                | RuntimeError::ClientDisconnected
                | RuntimeError::Result(ResultError::RuntimeRestarted)
        )
    }
}

impl From<toml::de::Error> for RuntimeError {
    fn from(e: toml::de::Error) -> Self {
        RuntimeError::Config(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
