// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wrapper process handle and its exit watcher.

use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::RuntimeError;

/// How the wrapper process ended.
#[derive(Debug, Clone)]
pub struct ProcessExit {
    pub pid: u32,
    /// `None` when waiting on the child failed.
    pub status: Option<ExitStatus>,
    /// True when the exit was asked for (stop, restart, terminate).
    pub requested: bool,
}

impl ProcessExit {
    pub fn describe(&self) -> String {
        match self.status {
            Some(status) => status.to_string(),
            None => "unknown exit status".to_string(),
        }
    }
}

/// Called once from the watcher when the process exits.
pub type ExitHandler = Box<dyn FnOnce(&ProcessExit) + Send>;

/// A running wrapper process.
///
/// A watcher task owns the child and blocks on its exit. Cancelling the
/// watcher kills the child.
pub struct WrapperProcess {
    pid: u32,
    cancel: CancellationToken,
    expected_exit: Arc<AtomicBool>,
    exit_rx: watch::Receiver<Option<ProcessExit>>,
}

impl WrapperProcess {
    /// Take ownership of `child` and start watching it.
    pub fn watch(mut child: Child, on_exit: ExitHandler) -> Result<Self, RuntimeError> {
        let pid = child.id().ok_or_else(|| {
            RuntimeError::WrapperExited("process exited before it could be watched".to_string())
        })?;
        let cancel = CancellationToken::new();
        let expected_exit = Arc::new(AtomicBool::new(false));
        let (exit_tx, exit_rx) = watch::channel(None);

        let token = cancel.clone();
        let expected = Arc::clone(&expected_exit);
        tokio::spawn(async move {
            let (status, requested) = tokio::select! {
                status = child.wait() => (status, expected.load(Ordering::SeqCst)),
                _ = token.cancelled() => {
                    debug!(pid, "killing wrapper process");
                    if let Err(e) = child.start_kill() {
                        debug!(pid, error = %e, "kill failed (already exited?)");
                    }
                    (child.wait().await, true)
                }
            };

            let status = match status {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(pid, error = %e, "failed to wait on wrapper process");
                    None
                }
            };
            let exit = ProcessExit { pid, status, requested };
            if requested {
                info!(pid, status = %exit.describe(), "wrapper process exited");
            }
            on_exit(&exit);
            let _ = exit_tx.send(Some(exit));
        });

        Ok(Self { pid, cancel, expected_exit, exit_rx })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn has_exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }

    /// Mark the next exit as requested (e.g. after a terminate signal).
    pub fn expect_exit(&self) {
        self.expected_exit.store(true, Ordering::SeqCst);
    }

    pub fn signal(&self, sig: Signal) -> Result<(), RuntimeError> {
        let pid = i32::try_from(self.pid)
            .map_err(|_| RuntimeError::WrapperExited(format!("invalid pid {}", self.pid)))?;
        debug!(pid, signal = ?sig, "signaling wrapper process");
        signal::kill(Pid::from_raw(pid), sig)?;
        Ok(())
    }

    /// Resolve once the process has exited.
    pub async fn wait_exit(&self) -> ProcessExit {
        let mut rx = self.exit_rx.clone();
        loop {
            if let Some(exit) = rx.borrow_and_update().clone() {
                return exit;
            }
            if rx.changed().await.is_err() {
                // Watcher gone without reporting; treat as exited
                return ProcessExit { pid: self.pid, status: None, requested: true };
            }
        }
    }

    /// Kill the process and wait up to `timeout` for the watcher to reap it.
    ///
    /// Returns false if the timeout elapsed; the process is then assumed gone.
    pub async fn kill_and_wait(&self, timeout: Duration) -> bool {
        self.cancel.cancel();
        match tokio::time::timeout(timeout, self.wait_exit()).await {
            Ok(_) => true,
            Err(_) => {
                warn!(pid = self.pid, ?timeout, "wrapper did not exit in time, assuming terminated");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
