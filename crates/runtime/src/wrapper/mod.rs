// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wrapper strategies: how to launch each language's wrapper process and
//! what it can do once connected.

mod command;
mod dotnet;
mod jvm;
mod nodejs;
mod python;
mod ruby;

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;

use nrpc_wire::{EncodingKind, EventEncoder};
use tokio::process::{Child, Command};

pub use command::CommandWrapper;
pub use dotnet::DotnetWrapper;
pub use jvm::JvmWrapper;
pub use nodejs::NodejsWrapper;
pub use python::PythonWrapper;
pub use ruby::RubyWrapper;

use crate::config::{RuntimeConfig, WrapperKind};
use crate::connection::{BoxedWriter, SocketType};
use crate::RuntimeError;

/// Listener addresses handed to the wrapper: socket paths for unix
/// sockets, port numbers for TCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperAddresses {
    pub event: String,
    pub control: Option<String>,
}

/// Function identity exported to the wrapper's environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionEnv {
    pub name: String,
    pub description: String,
    pub version: String,
    pub handler: String,
    pub extra: BTreeMap<String, String>,
}

impl FunctionEnv {
    /// Variables set on top of the inherited parent environment.
    pub fn vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![
            ("NUCLIO_FUNCTION_NAME".to_string(), self.name.clone()),
            ("NUCLIO_FUNCTION_DESCRIPTION".to_string(), self.description.clone()),
            ("NUCLIO_FUNCTION_VERSION".to_string(), self.version.clone()),
            ("NUCLIO_FUNCTION_HANDLER".to_string(), self.handler.clone()),
        ];
        vars.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }
}

/// Capabilities and launch recipe of one wrapper flavor.
pub trait Wrapper: Send + Sync {
    fn kind(&self) -> WrapperKind;

    /// Build the command that starts the wrapper for `addresses`.
    fn command(&self, addresses: &WrapperAddresses) -> Result<Command, RuntimeError>;

    /// Launch the wrapper process.
    fn run_wrapper(
        &self,
        addresses: &WrapperAddresses,
        env: &FunctionEnv,
    ) -> Result<Child, RuntimeError> {
        let mut cmd = self.command(addresses)?;
        cmd.envs(env.vars()).stdin(Stdio::null()).kill_on_drop(true);
        let std_cmd = cmd.as_std();
        tracing::debug!(
            kind = %self.kind(),
            program = %std_cmd.get_program().to_string_lossy(),
            args = ?std_cmd.get_args().collect::<Vec<_>>(),
            "running wrapper"
        );
        cmd.spawn().map_err(RuntimeError::Spawn)
    }

    fn socket_type(&self) -> SocketType {
        SocketType::Unix
    }

    fn encoding(&self) -> EncodingKind {
        EncodingKind::Json
    }

    fn event_encoder(&self, writer: BoxedWriter) -> Box<dyn EventEncoder> {
        self.encoding().encoder(writer)
    }

    fn supports_control_communication(&self) -> bool {
        false
    }

    /// Whether the wrapper sends a start frame once initialized.
    fn wait_for_start(&self) -> bool {
        false
    }

    fn supports_restart(&self) -> bool {
        false
    }
}

/// Build the wrapper described by `config`.
pub fn from_config(config: &RuntimeConfig) -> Result<Arc<dyn Wrapper>, RuntimeError> {
    config.validate()?;
    let wrapper: Arc<dyn Wrapper> = match config.wrapper.kind {
        WrapperKind::Python => Arc::new(PythonWrapper::new(config)),
        WrapperKind::Java | WrapperKind::Kotlin => Arc::new(JvmWrapper::new(config)),
        WrapperKind::Nodejs => Arc::new(NodejsWrapper::new(config)),
        WrapperKind::Ruby => Arc::new(RubyWrapper::new(config)),
        WrapperKind::Dotnetcore => Arc::new(DotnetWrapper::new(config)),
        WrapperKind::Command => Arc::new(CommandWrapper::new(config)?),
    };
    Ok(wrapper)
}

/// `executable` from config, or the kind's default program.
fn executable_or(config: &RuntimeConfig, default: &str) -> std::path::PathBuf {
    config.wrapper.executable.clone().unwrap_or_else(|| default.into())
}

/// `script` from config, or the kind's default wrapper location.
fn script_or(config: &RuntimeConfig, default: &str) -> std::path::PathBuf {
    config.wrapper.script.clone().unwrap_or_else(|| default.into())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
