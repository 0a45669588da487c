// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use tokio::process::Command;

use super::{executable_or, script_or, Wrapper, WrapperAddresses};
use crate::config::{RuntimeConfig, WrapperKind};
use crate::RuntimeError;

const DEFAULT_EXECUTABLE: &str = "ruby";
const DEFAULT_SCRIPT: &str = "/opt/nuclio/wrapper.rb";

#[derive(Debug, Clone)]
pub struct RubyWrapper {
    executable: PathBuf,
    script: PathBuf,
    handler: String,
    extra_args: Vec<String>,
}

impl RubyWrapper {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            executable: executable_or(config, DEFAULT_EXECUTABLE),
            script: script_or(config, DEFAULT_SCRIPT),
            handler: config.function.handler.clone(),
            extra_args: config.wrapper.args.clone(),
        }
    }
}

impl Wrapper for RubyWrapper {
    fn kind(&self) -> WrapperKind {
        WrapperKind::Ruby
    }

    fn command(&self, addresses: &WrapperAddresses) -> Result<Command, RuntimeError> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(&self.script)
            .args(["--handler", &self.handler])
            .args(["--socket-path", &addresses.event])
            .args(&self.extra_args);
        Ok(cmd)
    }
}
