// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the runtime crate.

use std::path::PathBuf;
use std::time::Duration;

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// How long to wait for the wrapper to connect (default 2m,
/// `NRPC_CONNECTION_TIMEOUT_MS`).
pub fn connection_timeout() -> Duration {
    duration_ms("NRPC_CONNECTION_TIMEOUT_MS").unwrap_or(Duration::from_secs(120))
}

/// How long drain/terminate wait for the wrapper to finish (default 10s,
/// `NRPC_WORKER_TERMINATION_TIMEOUT_MS`).
pub fn worker_termination_timeout() -> Duration {
    duration_ms("NRPC_WORKER_TERMINATION_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// How long stop waits for a killed wrapper to be reaped (default 10s,
/// `NRPC_PROCESS_TERMINATION_TIMEOUT_MS`).
pub fn process_termination_timeout() -> Duration {
    duration_ms("NRPC_PROCESS_TERMINATION_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// Directory for unix socket files: NRPC_SOCKET_DIR > /tmp
pub fn socket_dir() -> PathBuf {
    std::env::var("NRPC_SOCKET_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
