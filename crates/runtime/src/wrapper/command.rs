// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use nrpc_wire::EncodingKind;
use tokio::process::Command;

use super::{Wrapper, WrapperAddresses};
use crate::config::{RuntimeConfig, WrapperKind};
use crate::connection::SocketType;
use crate::RuntimeError;

const EVENT_PLACEHOLDER: &str = "{event_socket}";
const CONTROL_PLACEHOLDER: &str = "{control_socket}";

/// Any program that speaks the wire protocol. Capabilities come from config.
///
/// `{event_socket}` and `{control_socket}` in the arguments are replaced
/// with the listener addresses.
#[derive(Debug, Clone)]
pub struct CommandWrapper {
    executable: PathBuf,
    args: Vec<String>,
    socket_type: SocketType,
    encoding: EncodingKind,
    control: bool,
    wait_for_start: bool,
    restart: bool,
}

impl CommandWrapper {
    pub fn new(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let w = &config.wrapper;
        let executable = w.executable.clone().ok_or_else(|| {
            RuntimeError::Config("wrapper.executable is required for kind \"command\"".to_string())
        })?;
        Ok(Self {
            executable,
            args: w.args.clone(),
            socket_type: w.socket_type.unwrap_or_default(),
            encoding: w.encoding.unwrap_or_default(),
            control: w.control.unwrap_or(false),
            wait_for_start: w.wait_for_start.unwrap_or(false),
            restart: w.restart.unwrap_or(true),
        })
    }
}

impl Wrapper for CommandWrapper {
    fn kind(&self) -> WrapperKind {
        WrapperKind::Command
    }

    fn command(&self, addresses: &WrapperAddresses) -> Result<Command, RuntimeError> {
        let control = addresses.control.as_deref().unwrap_or("");
        let mut cmd = Command::new(&self.executable);
        cmd.args(self.args.iter().map(|arg| {
            arg.replace(EVENT_PLACEHOLDER, &addresses.event).replace(CONTROL_PLACEHOLDER, control)
        }));
        Ok(cmd)
    }

    fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    fn supports_control_communication(&self) -> bool {
        self.control
    }

    fn wait_for_start(&self) -> bool {
        self.wait_for_start
    }

    fn supports_restart(&self) -> bool {
        self.restart
    }
}
