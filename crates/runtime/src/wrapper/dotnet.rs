// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use tokio::process::Command;

use super::{executable_or, script_or, Wrapper, WrapperAddresses};
use crate::config::{RuntimeConfig, WrapperKind};
use crate::RuntimeError;

const DEFAULT_EXECUTABLE: &str = "dotnet";
const DEFAULT_ASSEMBLY: &str = "/opt/nuclio/wrapper/wrapper.dll";

/// .NET Core wrapper: `dotnet wrapper.dll <socket> <handler>`.
#[derive(Debug, Clone)]
pub struct DotnetWrapper {
    executable: PathBuf,
    assembly: PathBuf,
    handler: String,
    extra_args: Vec<String>,
}

impl DotnetWrapper {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            executable: executable_or(config, DEFAULT_EXECUTABLE),
            assembly: script_or(config, DEFAULT_ASSEMBLY),
            handler: config.function.handler.clone(),
            extra_args: config.wrapper.args.clone(),
        }
    }
}

impl Wrapper for DotnetWrapper {
    fn kind(&self) -> WrapperKind {
        WrapperKind::Dotnetcore
    }

    fn command(&self, addresses: &WrapperAddresses) -> Result<Command, RuntimeError> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(&self.assembly)
            .arg(&addresses.event)
            .arg(&self.handler)
            .args(&self.extra_args);
        Ok(cmd)
    }
}
