// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn defaults_when_unset() {
    std::env::remove_var("NRPC_CONNECTION_TIMEOUT_MS");
    std::env::remove_var("NRPC_WORKER_TERMINATION_TIMEOUT_MS");
    std::env::remove_var("NRPC_PROCESS_TERMINATION_TIMEOUT_MS");
    std::env::remove_var("NRPC_SOCKET_DIR");

    assert_eq!(connection_timeout(), Duration::from_secs(120));
    assert_eq!(worker_termination_timeout(), Duration::from_secs(10));
    assert_eq!(process_termination_timeout(), Duration::from_secs(10));
    assert_eq!(socket_dir(), PathBuf::from("/tmp"));
}

#[test]
#[serial]
fn overrides_from_env() {
    std::env::set_var("NRPC_CONNECTION_TIMEOUT_MS", "1500");
    std::env::set_var("NRPC_SOCKET_DIR", "/var/run/nrpc");
    assert_eq!(connection_timeout(), Duration::from_millis(1500));
    assert_eq!(socket_dir(), PathBuf::from("/var/run/nrpc"));
    std::env::remove_var("NRPC_CONNECTION_TIMEOUT_MS");
    std::env::remove_var("NRPC_SOCKET_DIR");
}

#[test]
#[serial]
fn unparseable_value_falls_back_to_default() {
    std::env::set_var("NRPC_WORKER_TERMINATION_TIMEOUT_MS", "soon");
    assert_eq!(worker_termination_timeout(), Duration::from_secs(10));
    std::env::remove_var("NRPC_WORKER_TERMINATION_TIMEOUT_MS");
}
