// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control connection: inbound control messages fanned out by the broker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::BoxedReader;
use crate::broker::ControlMessageBroker;

/// Errors within this window count toward the same burst.
const ERROR_WINDOW: Duration = Duration::from_millis(500);
/// Log one error out of every this many in a burst.
const ERROR_LOG_EVERY: u64 = 5;

pub struct ControlConnection {
    address: String,
    cancel: CancellationToken,
}

impl ControlConnection {
    pub(crate) fn start(
        reader: BoxedReader,
        address: String,
        broker: Arc<ControlMessageBroker>,
    ) -> Arc<Self> {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let loop_address = address.clone();
        tokio::spawn(async move {
            read_loop(BufReader::new(reader), broker, token).await;
            debug!(address = %loop_address, "control read loop exited");
        });
        Arc::new(Self { address, cancel })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn read_loop(
    mut reader: BufReader<BoxedReader>,
    broker: Arc<ControlMessageBroker>,
    cancel: CancellationToken,
) {
    let mut throttle = ErrorThrottle::new();
    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => return,
            read = broker.read_control_message(&mut reader) => read,
        };

        let message = match read {
            Ok(message) => {
                throttle.reset();
                message
            }
            Err(e) if e.is_closed() => {
                debug!("wrapper closed control connection");
                return;
            }
            Err(e) => {
                if throttle.should_log() {
                    warn!(error = %e, "failed to read control message");
                }
                continue;
            }
        };

        debug!(kind = %message.kind, "received control message");
        if let Err(e) = broker.send_to_consumers(message).await {
            warn!(error = %e, "failed to deliver control message");
        }
    }
}

/// Rate limit for repeated read errors on a noisy connection.
struct ErrorThrottle {
    count: u64,
    last: Instant,
}

impl ErrorThrottle {
    fn new() -> Self {
        Self { count: 0, last: Instant::now() }
    }

    fn should_log(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last) > ERROR_WINDOW {
            self.count = 0;
        }
        self.last = now;
        let log = self.count % ERROR_LOG_EVERY == 0;
        self.count += 1;
        log
    }

    /// A good read ends the burst.
    fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
