// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nrpc run` - Start a wrapper and feed it events
//!
//! Reads event lines from stdin (or `--input`), writes one response line
//! per event to stdout. With `--batch-size` above one, a partial batch is
//! sent after `--batch-timeout-ms`.
//!
//! SIGINT/SIGTERM terminate the wrapper gracefully, SIGUSR2 drains it and
//! SIGCONT resumes it. An unexpected wrapper exit ends the command with a
//! non-zero status.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use nix::sys::signal::Signal;
use nrpc_core::{Event, RuntimeStatus, TriggerInfo};
use nrpc_runtime::{wrapper, FatalEvent, Runtime, RuntimeError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use super::load_config;
use crate::exit_error::{ExitError, EXIT_WRAPPER};
use crate::input::EventInput;
use crate::output::ResponseLine;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the runtime config file
    #[arg(long, short)]
    pub config: PathBuf,

    /// Read events from this file instead of stdin
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Send up to this many events per frame
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub batch_size: u16,

    /// Send a partial batch once its first event has waited this long
    #[arg(long, default_value_t = 100)]
    pub batch_timeout_ms: u64,
}

/// When pending events are sent to the wrapper.
#[derive(Debug, Clone, Copy)]
struct Batching {
    size: usize,
    timeout: Duration,
}

/// Why the event loop ended.
enum Shutdown {
    InputDone,
    Signal,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let wrapper = wrapper::from_config(&config).map_err(|e| ExitError::config(e.to_string()))?;
    let trigger = TriggerInfo::new(
        non_empty(&config.function.trigger_kind, "cli"),
        non_empty(&config.function.trigger_name, "stdin"),
    )
    .class("sync");

    let (fatal_tx, mut fatal_rx) = mpsc::channel(1);
    let runtime = Arc::new(Runtime::new(config, wrapper, fatal_tx));
    if let Err(e) = runtime.start().await {
        runtime.stop().await?;
        return Err(ExitError::new(EXIT_WRAPPER, format!("failed to start wrapper: {e}")).into());
    }

    let batching = Batching {
        size: usize::from(args.batch_size),
        timeout: Duration::from_millis(args.batch_timeout_ms),
    };
    let input = open_input(args.input.as_ref()).await?;
    let result = serve(&runtime, input, &trigger, batching, &mut fatal_rx).await;

    if let Ok(Shutdown::Signal) = result {
        if let Err(e) = runtime.terminate().await {
            warn!(error = %e, "failed to terminate wrapper");
        }
    }
    runtime.stop().await?;
    let stats = runtime.statistics().snapshot();
    info!(
        invocations = stats.duration_ms_count,
        mean_ms = stats.mean_ms().unwrap_or_default(),
        "runtime stopped"
    );
    result.map(|_| ())
}

async fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

async fn serve(
    runtime: &Runtime,
    input: Box<dyn AsyncBufRead + Unpin + Send>,
    trigger: &TriggerInfo,
    batching: Batching,
    fatal_rx: &mut mpsc::Receiver<FatalEvent>,
) -> Result<Shutdown> {
    let mut lines = input.lines();
    let mut pending: Vec<Event> = Vec::with_capacity(batching.size);
    let mut flush_at = Instant::now();
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut drain = signal(SignalKind::user_defined2())?;
    let mut resume = signal(SignalKind::from_raw(Signal::SIGCONT as i32))?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    dispatch(runtime, &mut pending).await?;
                    return Ok(Shutdown::InputDone);
                };
                if line.trim().is_empty() {
                    continue;
                }
                match EventInput::parse(&line).and_then(|input| input.into_event(trigger)) {
                    Ok(event) => {
                        if pending.is_empty() {
                            flush_at = Instant::now() + batching.timeout;
                        }
                        pending.push(event);
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping event line");
                        continue;
                    }
                }
                if pending.len() >= batching.size {
                    dispatch(runtime, &mut pending).await?;
                }
            }
            _ = tokio::time::sleep_until(flush_at), if !pending.is_empty() => {
                dispatch(runtime, &mut pending).await?;
            }
            Some(event) = fatal_rx.recv() => {
                return Err(ExitError::fatal(&event).into());
            }
            _ = interrupt.recv() => return Ok(Shutdown::Signal),
            _ = terminate.recv() => return Ok(Shutdown::Signal),
            _ = drain.recv() => runtime.drain().await?,
            _ = resume.recv() => runtime.continue_().await?,
        }
    }
}

/// Send the pending events and print their responses.
async fn dispatch(runtime: &Runtime, pending: &mut Vec<Event>) -> Result<()> {
    let events = std::mem::take(pending);
    match events.as_slice() {
        [] => {}
        [event] => {
            let result = runtime.process_event(event, None).await;
            ResponseLine::from_result(&event.id, result).print()?;
        }
        batch => match runtime.process_batch(batch, None).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    let result = outcome.outcome.map_err(RuntimeError::from);
                    ResponseLine::from_result(&outcome.event_id, result).print()?;
                }
            }
            Err(e) => {
                for event in batch {
                    ResponseLine::error(&event.id, &e).print()?;
                }
            }
        },
    }

    // A broken connection cannot recover without a restart
    if runtime.status() == RuntimeStatus::Error {
        return Err(ExitError::new(EXIT_WRAPPER, "wrapper connection lost").into());
    }
    Ok(())
}

fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}
