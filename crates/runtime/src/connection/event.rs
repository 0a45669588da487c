// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event connection: outbound events, inbound results/logs/metrics.

use std::sync::Arc;

use nrpc_core::{BatchOutcome, BatchedResults, EventResult, TransportError};
use nrpc_wire::{decode_frame, EventEncoder, Frame, Payload, ProtocolError};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BoxedReader, ConnectionContext};
use crate::logger::{self, FunctionLogger};
use crate::RuntimeError;

type LoggerSlot = Arc<Mutex<Option<Arc<dyn FunctionLogger>>>>;
type PendingSlot = Arc<Mutex<Option<oneshot::Sender<BatchOutcome>>>>;

/// One accepted event connection.
///
/// At most one call is in flight at a time. Each call installs its own
/// result slot. A result frame arriving while no call is waiting is
/// discarded rather than queued for the next call.
pub struct EventConnection {
    address: String,
    encoder: tokio::sync::Mutex<Box<dyn EventEncoder>>,
    pending: PendingSlot,
    function_logger: LoggerSlot,
    cancel: CancellationToken,
    disconnected: CancellationToken,
}

impl EventConnection {
    /// Spawn the read loop and return the connection plus its start signal.
    pub(crate) fn start(
        reader: BoxedReader,
        encoder: Box<dyn EventEncoder>,
        address: String,
        ctx: ConnectionContext,
    ) -> (Arc<Self>, oneshot::Receiver<()>) {
        let (start_tx, start_rx) = oneshot::channel();
        let pending: PendingSlot = Arc::new(Mutex::new(None));
        let function_logger: LoggerSlot = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();
        let disconnected = CancellationToken::new();

        let read_loop = ReadLoop {
            reader: BufReader::new(reader),
            pending: Arc::clone(&pending),
            start: Some(start_tx),
            function_logger: Arc::clone(&function_logger),
            ctx,
            cancel: cancel.clone(),
        };
        let done = disconnected.clone();
        let loop_address = address.clone();
        tokio::spawn(async move {
            read_loop.run().await;
            debug!(address = %loop_address, "event read loop exited");
            done.cancel();
        });

        let connection = Arc::new(Self {
            address,
            encoder: tokio::sync::Mutex::new(encoder),
            pending,
            function_logger,
            cancel,
            disconnected,
        });
        (connection, start_rx)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one event or batch and wait for its results.
    ///
    /// `logger` receives wrapper log records emitted during this call.
    pub async fn process(
        &self,
        payload: Payload<'_>,
        logger: Option<Arc<dyn FunctionLogger>>,
    ) -> Result<BatchedResults, RuntimeError> {
        let mut encoder = self.encoder.lock().await;

        if self.disconnected.is_cancelled() {
            return Err(self.closed_error());
        }

        let (result_tx, mut result_rx) = oneshot::channel();
        let _pending = PendingGuard::set(&self.pending, result_tx);
        let _logger = LoggerGuard::set(&self.function_logger, logger);

        if let Err(e) = encoder.encode(payload).await {
            if self.disconnected.is_cancelled() {
                return Err(self.closed_error());
            }
            return Err(e.into());
        }

        let outcome = tokio::select! {
            biased;
            outcome = &mut result_rx => outcome.ok(),
            _ = self.disconnected.cancelled() => None,
        };
        // The read loop may have answered just before exiting
        match outcome.or_else(|| result_rx.try_recv().ok()) {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(e)) => Err(RuntimeError::Transport(e)),
            None => Err(self.closed_error()),
        }
    }

    fn closed_error(&self) -> RuntimeError {
        if self.cancel.is_cancelled() {
            RuntimeError::Restarted
        } else {
            RuntimeError::ClientDisconnected
        }
    }

    /// Cancel the read loop. A blocked call receives a restarted result.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// True once the read loop has exited.
    pub fn is_closed(&self) -> bool {
        self.disconnected.is_cancelled()
    }
}

/// Clears the call's result slot when the call ends.
struct PendingGuard<'a>(&'a PendingSlot);

impl<'a> PendingGuard<'a> {
    fn set(slot: &'a PendingSlot, tx: oneshot::Sender<BatchOutcome>) -> Self {
        *slot.lock() = Some(tx);
        Self(slot)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().take();
    }
}

/// Clears the per-call function logger when the call ends.
struct LoggerGuard<'a>(&'a LoggerSlot);

impl<'a> LoggerGuard<'a> {
    fn set(slot: &'a LoggerSlot, logger: Option<Arc<dyn FunctionLogger>>) -> Self {
        *slot.lock() = logger;
        Self(slot)
    }
}

impl Drop for LoggerGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().take();
    }
}

/// Read errors after which the stream can never yield data again.
fn is_disconnect(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            | ErrorKind::NotConnected
    )
}

struct ReadLoop {
    reader: BufReader<BoxedReader>,
    pending: PendingSlot,
    start: Option<oneshot::Sender<()>>,
    function_logger: LoggerSlot,
    ctx: ConnectionContext,
    cancel: CancellationToken,
}

impl ReadLoop {
    async fn run(mut self) {
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = tokio::select! {
                _ = self.cancel.cancelled() => break,
                read = self.reader.read_until(b'\n', &mut line) => read,
            };

            match read {
                Ok(0) => {
                    debug!("wrapper closed event connection");
                    return;
                }
                Ok(_) => {}
                Err(e) if is_disconnect(&e) => {
                    debug!(error = %e, "event connection lost");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read from connection");
                    self.deliver(Err(TransportError::Read(e.to_string())));
                    continue;
                }
            }

            match decode_frame(&line) {
                Ok(Frame::Result(outcome)) => self.deliver(outcome),
                Ok(Frame::Metric { duration_secs }) => self.ctx.statistics.update(duration_secs),
                Ok(Frame::Log(record)) => {
                    let current = self.function_logger.lock().clone();
                    match current {
                        Some(logger) => logger::emit(logger.as_ref(), &record),
                        None => logger::emit(self.ctx.runtime_logger.as_ref(), &record),
                    }
                }
                Ok(Frame::Start) => match self.start.take() {
                    Some(tx) => {
                        debug!("wrapper signaled start");
                        let _ = tx.send(());
                    }
                    None => debug!("ignoring repeated start signal"),
                },
                Ok(Frame::Unknown(tag)) => {
                    debug!(tag = %char::from(tag), "ignoring frame with unknown tag")
                }
                Err(ProtocolError::MissingDuration) => warn!("No duration in metrics"),
                Err(ProtocolError::EmptyFrame) => debug!("ignoring empty frame"),
                Err(e) => warn!(error = %e, "failed to decode frame"),
            }
        }

        // Cancelled: release any blocked caller
        debug!("event read loop cancelled");
        let waiting = self.pending.lock().take();
        if let Some(tx) = waiting {
            let _ = tx.send(Ok(BatchedResults::single(EventResult::restarted())));
        }
    }

    /// Hand an outcome to the waiting call, if any.
    fn deliver(&self, outcome: BatchOutcome) {
        let waiting = self.pending.lock().take();
        match waiting {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => warn!(?outcome, "discarding result with no call waiting"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
