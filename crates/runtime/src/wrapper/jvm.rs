// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use tokio::process::Command;

use super::{executable_or, script_or, Wrapper, WrapperAddresses};
use crate::config::{FunctionConfig, RuntimeConfig, WrapperKind};
use crate::connection::SocketType;
use crate::RuntimeError;

const DEFAULT_EXECUTABLE: &str = "java";
const DEFAULT_JAR: &str = "/opt/nuclio/nuclio-java-wrapper.jar";

/// Java and Kotlin wrapper: JSON events over TCP. The event address is a
/// loopback port.
#[derive(Debug, Clone)]
pub struct JvmWrapper {
    kind: WrapperKind,
    executable: PathBuf,
    jar: PathBuf,
    function: FunctionConfig,
    extra_args: Vec<String>,
}

impl JvmWrapper {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            kind: config.wrapper.kind,
            executable: executable_or(config, DEFAULT_EXECUTABLE),
            jar: script_or(config, DEFAULT_JAR),
            function: config.function.clone(),
            extra_args: config.wrapper.args.clone(),
        }
    }
}

impl Wrapper for JvmWrapper {
    fn kind(&self) -> WrapperKind {
        self.kind
    }

    fn command(&self, addresses: &WrapperAddresses) -> Result<Command, RuntimeError> {
        let f = &self.function;
        let mut cmd = Command::new(&self.executable);
        // JVM options go before -jar
        cmd.args(&self.extra_args)
            .arg("-server")
            .arg("-jar")
            .arg(&self.jar)
            .args(["-handler", &f.handler])
            .args(["-port", &addresses.event])
            .args(["-workerid", &f.worker_id.to_string()])
            .args(["-trigger-kind", &f.trigger_kind])
            .args(["-trigger-name", &f.trigger_name]);
        Ok(cmd)
    }

    fn socket_type(&self) -> SocketType {
        SocketType::Tcp
    }
}
