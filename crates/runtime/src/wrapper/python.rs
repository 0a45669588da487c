// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use nrpc_wire::EncodingKind;
use tokio::process::Command;

use super::{executable_or, script_or, Wrapper, WrapperAddresses};
use crate::config::{FunctionConfig, RuntimeConfig, WrapperKind};
use crate::connection::SocketType;
use crate::RuntimeError;

const DEFAULT_EXECUTABLE: &str = "python3";
const DEFAULT_SCRIPT: &str = "/opt/nuclio/_nuclio_wrapper.py";

/// Python wrapper: MessagePack events over a single unix socket, with a
/// start frame. The wrapper script takes one `--socket-path` and has no
/// control channel.
#[derive(Debug, Clone)]
pub struct PythonWrapper {
    executable: PathBuf,
    script: PathBuf,
    function: FunctionConfig,
    extra_args: Vec<String>,
}

impl PythonWrapper {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            executable: executable_or(config, DEFAULT_EXECUTABLE),
            script: script_or(config, DEFAULT_SCRIPT),
            function: config.function.clone(),
            extra_args: config.wrapper.args.clone(),
        }
    }
}

impl Wrapper for PythonWrapper {
    fn kind(&self) -> WrapperKind {
        WrapperKind::Python
    }

    fn command(&self, addresses: &WrapperAddresses) -> Result<Command, RuntimeError> {
        let f = &self.function;
        let mut cmd = Command::new(&self.executable);
        // -u: unbuffered stdout/stderr so wrapper output interleaves with ours
        cmd.arg("-u")
            .arg(&self.script)
            .args(["--handler", &f.handler])
            .args(["--socket-path", &addresses.event])
            .args(["--platform-kind", "local"])
            .args(["--namespace", &f.namespace])
            .args(["--worker-id", &f.worker_id.to_string()])
            .args(["--trigger-kind", &f.trigger_kind])
            .args(["--trigger-name", &f.trigger_name])
            .args(&self.extra_args);
        Ok(cmd)
    }

    fn socket_type(&self) -> SocketType {
        SocketType::Unix
    }

    fn encoding(&self) -> EncodingKind {
        EncodingKind::Msgpack
    }

    fn supports_control_communication(&self) -> bool {
        false
    }

    fn wait_for_start(&self) -> bool {
        true
    }

    fn supports_restart(&self) -> bool {
        true
    }
}
