// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nrpc config` - Inspect runtime configuration files

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use nrpc_runtime::wrapper;

use super::load_config;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration, timeouts included
    Show {
        /// Path to the runtime config file
        #[arg(long, short)]
        config: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Check that a configuration can launch a wrapper
    Validate {
        /// Path to the runtime config file
        #[arg(long, short)]
        config: PathBuf,
    },
}

pub fn config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show { config, format } => show(config, format),
        ConfigCommand::Validate { config } => validate(config),
    }
}

fn show(path: PathBuf, format: OutputFormat) -> Result<()> {
    let mut config = load_config(&path)?;
    // Fill env-derived defaults so the output shows what would be used
    let timeouts = &mut config.timeouts;
    timeouts.connection_ms = Some(timeouts.connection().as_millis() as u64);
    timeouts.worker_termination_ms = Some(timeouts.worker_termination().as_millis() as u64);
    timeouts.process_termination_ms = Some(timeouts.process_termination().as_millis() as u64);

    match format {
        OutputFormat::Toml => print!("{}", toml::to_string_pretty(&config)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

fn validate(path: PathBuf) -> Result<()> {
    let config = load_config(&path)?;
    let wrapper = wrapper::from_config(&config).map_err(|e| ExitError::config(e.to_string()))?;
    println!(
        "{}: ok ({} wrapper, {} over {})",
        path.display(),
        wrapper.kind(),
        wrapper.encoding(),
        wrapper.socket_type()
    );
    Ok(())
}
