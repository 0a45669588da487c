// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lifecycle manager.
//!
//! States: `Initializing -> Ready -> {Error, Stopped}`; restart goes through
//! stop and start again. Lifecycle operations are serialized by an async
//! mutex. The event path never takes it, so a restart can release a call
//! blocked on the old connection.

use std::sync::Arc;

use nix::sys::signal::Signal;
use nrpc_core::{ControlMessageKind, Event, Response, RuntimeStatus, Statistics};
use nrpc_wire::Payload;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Instrument};

use crate::broker::ControlMessageBroker;
use crate::config::RuntimeConfig;
use crate::connection::{ConnectionContext, ConnectionManager, EventConnection};
use crate::dispatch::{correlate, first_response, EventOutcome};
use crate::env;
use crate::logger::{FunctionLogger, TracingLogger};
use crate::process::{ExitHandler, ProcessExit, WrapperProcess};
use crate::wrapper::Wrapper;
use crate::RuntimeError;

/// Reported to the supervisor when the runtime can no longer serve events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalEvent {
    /// The wrapper exited without being asked to.
    WrapperExited { pid: u32, status: String },
}

/// Status shared with the process watcher.
struct Shared {
    status: Mutex<RuntimeStatus>,
    fatal_tx: mpsc::Sender<FatalEvent>,
}

impl Shared {
    fn status(&self) -> RuntimeStatus {
        *self.status.lock()
    }

    fn set_status(&self, status: RuntimeStatus) {
        let mut current = self.status.lock();
        if *current != status {
            debug!(from = %*current, to = %status, "runtime status changed");
            *current = status;
        }
    }

    /// Error, unless a stop already moved the runtime to Stopped.
    fn mark_error(&self) {
        let mut current = self.status.lock();
        if *current != RuntimeStatus::Stopped {
            *current = RuntimeStatus::Error;
        }
    }
}

/// Resources owned by the current wrapper instance.
#[derive(Default)]
struct Lifecycle {
    process: Option<Arc<WrapperProcess>>,
    connections: Option<ConnectionManager>,
}

pub struct Runtime {
    config: RuntimeConfig,
    wrapper: Arc<dyn Wrapper>,
    shared: Arc<Shared>,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
    event_connection: Mutex<Option<Arc<EventConnection>>>,
    pid: Mutex<Option<u32>>,
    statistics: Arc<Statistics>,
    broker: Arc<ControlMessageBroker>,
    logger: Arc<dyn FunctionLogger>,
}

impl Runtime {
    /// Create a runtime. Unexpected wrapper exits are sent on `fatal_tx`.
    pub fn new(
        config: RuntimeConfig,
        wrapper: Arc<dyn Wrapper>,
        fatal_tx: mpsc::Sender<FatalEvent>,
    ) -> Self {
        let logger = Arc::new(TracingLogger::new(config.function.name.clone()));
        Self {
            config,
            wrapper,
            shared: Arc::new(Shared {
                status: Mutex::new(RuntimeStatus::Initializing),
                fatal_tx,
            }),
            lifecycle: tokio::sync::Mutex::new(Lifecycle::default()),
            event_connection: Mutex::new(None),
            pid: Mutex::new(None),
            statistics: Arc::new(Statistics::new()),
            broker: Arc::new(ControlMessageBroker::new()),
            logger,
        }
    }

    /// Replace the logger used for wrapper logs outside of any call.
    pub fn with_logger(mut self, logger: Arc<dyn FunctionLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn status(&self) -> RuntimeStatus {
        self.shared.status()
    }

    /// PID of the current wrapper process, if one is running.
    pub fn pid(&self) -> Option<u32> {
        *self.pid.lock()
    }

    pub fn statistics(&self) -> &Arc<Statistics> {
        &self.statistics
    }

    pub fn broker(&self) -> &Arc<ControlMessageBroker> {
        &self.broker
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn wrapper(&self) -> &Arc<dyn Wrapper> {
        &self.wrapper
    }

    /// Launch the wrapper and wait until it is connected (and started, if it
    /// signals start).
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let span = tracing::info_span!("runtime.start", function = %self.config.function.name);
        async {
            let mut lifecycle = self.lifecycle.lock().await;
            self.start_locked(&mut lifecycle).await
        }
        .instrument(span)
        .await
    }

    /// Kill the wrapper and release its connections. Safe to call at any time.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.stop_locked(&mut lifecycle).await;
        Ok(())
    }

    /// Stop, then start a fresh wrapper process.
    pub async fn restart(&self) -> Result<(), RuntimeError> {
        if !self.wrapper.supports_restart() {
            return Err(RuntimeError::RestartUnsupported);
        }
        let span = tracing::info_span!("runtime.restart", function = %self.config.function.name);
        async {
            let mut lifecycle = self.lifecycle.lock().await;
            info!(pid = ?self.pid(), "restarting runtime");
            self.stop_locked(&mut lifecycle).await;
            self.start_locked(&mut lifecycle).await
        }
        .instrument(span)
        .await
    }

    /// Ask the wrapper to finish in-flight work (SIGUSR2) and wait for it.
    pub async fn drain(&self) -> Result<(), RuntimeError> {
        let lifecycle = self.lifecycle.lock().await;
        let Some(process) = self.ready_process(&lifecycle, "drain") else {
            return Ok(());
        };
        self.signal_and_wait(&process, Signal::SIGUSR2, "drain").await
    }

    /// Resume a drained wrapper (SIGCONT). Does not wait.
    pub async fn continue_(&self) -> Result<(), RuntimeError> {
        let lifecycle = self.lifecycle.lock().await;
        let Some(process) = self.ready_process(&lifecycle, "continue") else {
            return Ok(());
        };
        process.signal(Signal::SIGCONT)
    }

    /// Ask the wrapper to shut down (SIGUSR1) and wait for it.
    pub async fn terminate(&self) -> Result<(), RuntimeError> {
        let lifecycle = self.lifecycle.lock().await;
        let Some(process) = self.ready_process(&lifecycle, "terminate") else {
            return Ok(());
        };
        process.expect_exit();
        self.signal_and_wait(&process, Signal::SIGUSR1, "terminate").await
    }

    /// Process one event and return its response.
    ///
    /// `logger` receives wrapper log records emitted while handling it.
    pub async fn process_event(
        &self,
        event: &Event,
        logger: Option<Arc<dyn FunctionLogger>>,
    ) -> Result<Response, RuntimeError> {
        let connection = self.ready_connection()?;
        debug!(event_id = %event.id, "processing event");
        let results = self.dispatch(&connection, Payload::Single(event), logger).await?;
        first_response(results)
    }

    /// Process a batch in one frame; one outcome per input event, in order.
    pub async fn process_batch(
        &self,
        events: &[Event],
        logger: Option<Arc<dyn FunctionLogger>>,
    ) -> Result<Vec<EventOutcome>, RuntimeError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let connection = self.ready_connection()?;
        debug!(count = events.len(), "processing batch");
        let results = self.dispatch(&connection, Payload::Batch(events), logger).await?;
        Ok(correlate(events, results))
    }

    fn ready_connection(&self) -> Result<Arc<EventConnection>, RuntimeError> {
        let status = self.status();
        if status != RuntimeStatus::Ready {
            return Err(RuntimeError::NotReady(status));
        }
        self.event_connection.lock().clone().ok_or(RuntimeError::NotReady(status))
    }

    async fn dispatch(
        &self,
        connection: &EventConnection,
        payload: Payload<'_>,
        logger: Option<Arc<dyn FunctionLogger>>,
    ) -> Result<nrpc_core::BatchedResults, RuntimeError> {
        let result = connection.process(payload, logger).await;
        if let Err(RuntimeError::ClientDisconnected) = &result {
            error!(address = %connection.address(), "wrapper disconnected");
            self.shared.mark_error();
        }
        result
    }

    fn ready_process(&self, lifecycle: &Lifecycle, op: &str) -> Option<Arc<WrapperProcess>> {
        let status = self.status();
        if status != RuntimeStatus::Ready {
            debug!(%status, op, "runtime not ready, skipping");
            return None;
        }
        lifecycle.process.clone()
    }

    /// Signal the wrapper, then wait for drainDone, wrapper exit, or timeout.
    async fn signal_and_wait(
        &self,
        process: &WrapperProcess,
        sig: Signal,
        op: &str,
    ) -> Result<(), RuntimeError> {
        let timeout = self.config.timeouts.worker_termination();
        let (done_tx, mut done_rx) = mpsc::channel(1);
        self.broker.subscribe(ControlMessageKind::DrainDone, done_tx.clone())?;

        let signaled = process.signal(sig);
        if signaled.is_ok() {
            info!(pid = process.pid(), op, "waiting for wrapper");
            tokio::select! {
                Some(_) = done_rx.recv() => debug!(op, "wrapper reported drain done"),
                exit = process.wait_exit() => debug!(op, status = %exit.describe(), "wrapper exited"),
                _ = tokio::time::sleep(timeout) => {
                    debug!(op, ?timeout, "timed out waiting for wrapper, assuming completed")
                }
            }
        }

        self.broker.unsubscribe(ControlMessageKind::DrainDone, &done_tx)?;
        signaled
    }

    async fn start_locked(&self, lifecycle: &mut Lifecycle) -> Result<(), RuntimeError> {
        self.shared.set_status(RuntimeStatus::Initializing);
        let start = std::time::Instant::now();
        let result = self.launch(lifecycle).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                self.shared.set_status(RuntimeStatus::Ready);
                info!(pid = ?self.pid(), kind = %self.wrapper.kind(), elapsed_ms, "runtime ready");
                Ok(())
            }
            Err(e) => {
                error!(elapsed_ms, error = %e, "failed to start runtime");
                self.teardown(lifecycle).await;
                self.shared.set_status(RuntimeStatus::Error);
                Err(e)
            }
        }
    }

    async fn launch(&self, lifecycle: &mut Lifecycle) -> Result<(), RuntimeError> {
        let manager = ConnectionManager::bind(
            self.wrapper.socket_type(),
            self.wrapper.supports_control_communication(),
            &env::socket_dir(),
        )?;
        let addresses = manager.addresses();
        let manager = lifecycle.connections.insert(manager);

        let child = self.wrapper.run_wrapper(&addresses, &self.config.function_env())?;
        let process = Arc::new(WrapperProcess::watch(child, self.exit_handler())?);
        *self.pid.lock() = Some(process.pid());
        lifecycle.process = Some(Arc::clone(&process));
        debug!(pid = process.pid(), event = %addresses.event, control = ?addresses.control, "wrapper launched");

        let ctx = ConnectionContext {
            statistics: Arc::clone(&self.statistics),
            runtime_logger: Arc::clone(&self.logger),
            broker: Arc::clone(&self.broker),
        };
        let timeout = self.config.timeouts.connection();
        tokio::select! {
            started = manager.start(self.wrapper.as_ref(), ctx, timeout) => started?,
            exit = process.wait_exit() => {
                return Err(RuntimeError::WrapperExited(exit.describe()));
            }
        }

        *self.event_connection.lock() = manager.allocate();
        Ok(())
    }

    async fn stop_locked(&self, lifecycle: &mut Lifecycle) {
        self.shared.set_status(RuntimeStatus::Stopped);
        self.teardown(lifecycle).await;
    }

    /// Cancel connections, kill the process, remove socket files.
    async fn teardown(&self, lifecycle: &mut Lifecycle) {
        self.event_connection.lock().take();
        if let Some(connections) = lifecycle.connections.take() {
            connections.stop();
            connections.remove_socket_files();
        }
        self.broker.detach_writer().await;

        if let Some(process) = lifecycle.process.take() {
            let timeout = self.config.timeouts.process_termination();
            if process.kill_and_wait(timeout).await {
                debug!(pid = process.pid(), "wrapper process stopped");
            }
        }
        self.pid.lock().take();
    }

    fn exit_handler(&self) -> ExitHandler {
        let shared = Arc::clone(&self.shared);
        Box::new(move |exit: &ProcessExit| {
            if exit.requested {
                return;
            }
            error!(pid = exit.pid, status = %exit.describe(), "wrapper process exited unexpectedly");
            shared.mark_error();
            let event = FatalEvent::WrapperExited { pid: exit.pid, status: exit.describe() };
            if let Err(e) = shared.fatal_tx.try_send(event) {
                warn!(error = %e, "failed to report wrapper exit");
            }
        })
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
