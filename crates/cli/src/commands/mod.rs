// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod config;
pub mod run;

use std::path::Path;

use anyhow::Result;
use nrpc_runtime::RuntimeConfig;

use crate::exit_error::ExitError;

/// Load and validate a config file, mapping failures to the config exit code.
pub(crate) fn load_config(path: &Path) -> Result<RuntimeConfig> {
    RuntimeConfig::load(path)
        .map_err(|e| ExitError::config(format!("{}: {e}", path.display())).into())
}
