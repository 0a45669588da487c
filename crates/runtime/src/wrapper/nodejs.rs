// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use tokio::process::Command;

use super::{executable_or, script_or, Wrapper, WrapperAddresses};
use crate::config::{RuntimeConfig, WrapperKind};
use crate::RuntimeError;

const DEFAULT_EXECUTABLE: &str = "node";
const DEFAULT_SCRIPT: &str = "/opt/nuclio/wrapper.js";

/// Node.js wrapper: `node wrapper.js <socket> <handler file> <handler name>`.
#[derive(Debug, Clone)]
pub struct NodejsWrapper {
    executable: PathBuf,
    script: PathBuf,
    handler: String,
    extra_args: Vec<String>,
}

impl NodejsWrapper {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            executable: executable_or(config, DEFAULT_EXECUTABLE),
            script: script_or(config, DEFAULT_SCRIPT),
            handler: config.function.handler.clone(),
            extra_args: config.wrapper.args.clone(),
        }
    }

    /// Split `module:function` into a `.js` file path and an export name.
    fn handler_parts(&self) -> Result<(String, &str), RuntimeError> {
        let (module, name) = self.handler.split_once(':').ok_or_else(|| {
            RuntimeError::Config(format!(
                "nodejs handler must be \"<file>:<function>\", got {:?}",
                self.handler
            ))
        })?;
        let file =
            if module.ends_with(".js") { module.to_string() } else { format!("{module}.js") };
        Ok((file, name))
    }
}

impl Wrapper for NodejsWrapper {
    fn kind(&self) -> WrapperKind {
        WrapperKind::Nodejs
    }

    fn command(&self, addresses: &WrapperAddresses) -> Result<Command, RuntimeError> {
        let (file, name) = self.handler_parts()?;
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.extra_args).arg(&self.script).arg(&addresses.event).arg(file).arg(name);
        Ok(cmd)
    }
}
