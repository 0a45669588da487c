// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! [function]
//! name = "echo"
//! handler = "main:handler"
//!
//! [wrapper]
//! kind = "python"
//! script = "/opt/nuclio/_nuclio_wrapper.py"
//!
//! [timeouts]
//! connection_ms = 5000
//! ```
//!
//! Unset timeouts fall back to the `NRPC_*` environment defaults in [`crate::env`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nrpc_wire::EncodingKind;
use serde::{Deserialize, Serialize};

use crate::connection::SocketType;
use crate::env;
use crate::wrapper::FunctionEnv;
use crate::RuntimeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub function: FunctionConfig,
    pub wrapper: WrapperConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Identity of the function the wrapper hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    /// Entry point, e.g. `module:function` for Python.
    pub handler: String,
    pub namespace: String,
    pub worker_id: usize,
    pub trigger_kind: String,
    pub trigger_name: String,
}

/// Language of the wrapper process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapperKind {
    #[default]
    Python,
    Java,
    Kotlin,
    Nodejs,
    Ruby,
    Dotnetcore,
    /// Arbitrary program speaking the wire protocol.
    Command,
}

nrpc_core::simple_display! {
    WrapperKind {
        Python => "python",
        Java => "java",
        Kotlin => "kotlin",
        Nodejs => "nodejs",
        Ruby => "ruby",
        Dotnetcore => "dotnetcore",
        Command => "command",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrapperConfig {
    pub kind: WrapperKind,
    /// Interpreter or program to run (defaults per kind).
    #[serde(default)]
    pub executable: Option<PathBuf>,
    /// Wrapper script, jar, or assembly handed to the interpreter.
    #[serde(default)]
    pub script: Option<PathBuf>,
    /// Extra arguments appended after the kind's own arguments.
    /// For `command`, the full argument list; `{event_socket}` and
    /// `{control_socket}` are substituted.
    #[serde(default)]
    pub args: Vec<String>,

    // Capability overrides, honored by `command` only
    #[serde(default)]
    pub socket_type: Option<SocketType>,
    #[serde(default)]
    pub encoding: Option<EncodingKind>,
    #[serde(default)]
    pub control: Option<bool>,
    #[serde(default)]
    pub wait_for_start: Option<bool>,
    #[serde(default)]
    pub restart: Option<bool>,

    /// Extra environment for the wrapper process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connection_ms: Option<u64>,
    pub worker_termination_ms: Option<u64>,
    pub process_termination_ms: Option<u64>,
}

impl TimeoutConfig {
    pub fn connection(&self) -> Duration {
        self.connection_ms.map(Duration::from_millis).unwrap_or_else(env::connection_timeout)
    }

    pub fn worker_termination(&self) -> Duration {
        self.worker_termination_ms
            .map(Duration::from_millis)
            .unwrap_or_else(env::worker_termination_timeout)
    }

    pub fn process_termination(&self) -> Duration {
        self.process_termination_ms
            .map(Duration::from_millis)
            .unwrap_or_else(env::process_termination_timeout)
    }
}

impl RuntimeConfig {
    pub fn new(function: FunctionConfig, wrapper: WrapperConfig) -> Self {
        Self { function, wrapper, timeouts: TimeoutConfig::default() }
    }

    /// Read, parse, and validate a config file.
    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, RuntimeError> {
        let config: RuntimeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        let wrapper = &self.wrapper;
        match wrapper.kind {
            WrapperKind::Command => {
                if wrapper.executable.is_none() {
                    return Err(RuntimeError::Config(
                        "wrapper.executable is required for kind \"command\"".to_string(),
                    ));
                }
            }
            kind => {
                if self.function.handler.is_empty() {
                    return Err(RuntimeError::Config(format!(
                        "function.handler is required for kind \"{kind}\""
                    )));
                }
                let overridden = wrapper.socket_type.is_some()
                    || wrapper.encoding.is_some()
                    || wrapper.control.is_some()
                    || wrapper.wait_for_start.is_some()
                    || wrapper.restart.is_some();
                if overridden {
                    return Err(RuntimeError::Config(format!(
                        "capability overrides are only allowed for kind \"command\", not \"{kind}\""
                    )));
                }
            }
        }

        let zero = [
            ("connection_ms", self.timeouts.connection_ms),
            ("worker_termination_ms", self.timeouts.worker_termination_ms),
            ("process_termination_ms", self.timeouts.process_termination_ms),
        ]
        .into_iter()
        .find(|(_, v)| *v == Some(0));
        if let Some((name, _)) = zero {
            return Err(RuntimeError::Config(format!("timeouts.{name} must be greater than zero")));
        }

        Ok(())
    }

    /// Environment handed to the wrapper process.
    pub fn function_env(&self) -> FunctionEnv {
        FunctionEnv {
            name: self.function.name.clone(),
            description: self.function.description.clone(),
            version: self.function.version.clone(),
            handler: self.function.handler.clone(),
            extra: self.wrapper.env.clone(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
