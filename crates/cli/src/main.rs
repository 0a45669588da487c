// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nrpc: run a function wrapper process and feed it events over its socket
//! protocol.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod exit_error;
mod input;
mod logging;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{config, run};
use exit_error::ExitError;

#[derive(Parser)]
#[command(
    name = "nrpc",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("NRPC_GIT_HASH"), ")"),
    about = "Run a function wrapper and feed it events"
)]
struct Cli {
    /// Write logs to a daily rolling file in this directory instead of stderr
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the wrapper and process events from stdin or a file
    Run(run::RunArgs),
    /// Inspect configuration files
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_guard = logging::init(cli.log_dir.as_deref());

    let result = match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Config(args) => config::config(args),
    };

    if let Err(e) = result {
        let code = match e.downcast_ref::<ExitError>() {
            Some(exit) => exit.code,
            None => 1,
        };
        eprintln!("Error: {e:#}");
        drop(log_guard);
        std::process::exit(code);
    }
}
