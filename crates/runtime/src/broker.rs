// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-message broker.
//!
//! Fans control messages from the wrapper out to subscribers, keyed by kind:
//!
//! - `drainDone` is broadcast-and-close: the subscriber list is taken
//!   atomically and each subscriber gets the message exactly once. Later
//!   subscribers start a fresh list.
//! - `streamMessageAck` is a synchronous broadcast: delivery returns only
//!   after every subscriber has received and released its
//!   [`ControlDelivery`]. Subscribers stay registered.

use futures_util::future::join_all;
use nrpc_core::{ControlMessage, ControlMessageKind};
use nrpc_wire::ProtocolError;
use parking_lot::Mutex;
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::connection::BoxedWriter;
use crate::RuntimeError;

/// A control message handed to one subscriber.
///
/// Dropping the delivery releases the broker's read receipt.
#[derive(Debug)]
pub struct ControlDelivery {
    pub message: ControlMessage,
    _receipt: Option<oneshot::Sender<()>>,
}

impl ControlDelivery {
    fn new(message: ControlMessage, receipt: Option<oneshot::Sender<()>>) -> Self {
        Self { message, _receipt: receipt }
    }

    pub fn into_message(self) -> ControlMessage {
        self.message
    }
}

impl std::ops::Deref for ControlDelivery {
    type Target = ControlMessage;

    fn deref(&self) -> &ControlMessage {
        &self.message
    }
}

type Subscribers = Mutex<Vec<mpsc::Sender<ControlDelivery>>>;

#[derive(Default)]
pub struct ControlMessageBroker {
    drain_done: Subscribers,
    stream_ack: Subscribers,
    writer: tokio::sync::Mutex<Option<BoxedWriter>>,
}

impl ControlMessageBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribers(&self, kind: &ControlMessageKind) -> Result<&Subscribers, RuntimeError> {
        match kind {
            ControlMessageKind::DrainDone => Ok(&self.drain_done),
            ControlMessageKind::StreamMessageAck => Ok(&self.stream_ack),
            ControlMessageKind::Unknown(kind) => Err(RuntimeError::UnknownControlKind(kind.clone())),
        }
    }

    pub fn subscribe(
        &self,
        kind: ControlMessageKind,
        sender: mpsc::Sender<ControlDelivery>,
    ) -> Result<(), RuntimeError> {
        debug!(%kind, "subscribing to control messages");
        self.subscribers(&kind)?.lock().push(sender);
        Ok(())
    }

    /// Remove `sender` from `kind`'s list. No-op if it is not subscribed.
    pub fn unsubscribe(
        &self,
        kind: ControlMessageKind,
        sender: &mpsc::Sender<ControlDelivery>,
    ) -> Result<(), RuntimeError> {
        self.subscribers(&kind)?.lock().retain(|s| !s.same_channel(sender));
        Ok(())
    }

    pub fn subscriber_count(&self, kind: &ControlMessageKind) -> usize {
        self.subscribers(kind).map(|s| s.lock().len()).unwrap_or(0)
    }

    /// Deliver a message from the wrapper to the subscribers of its kind.
    pub async fn send_to_consumers(&self, message: ControlMessage) -> Result<(), RuntimeError> {
        match &message.kind {
            ControlMessageKind::DrainDone => {
                self.broadcast_and_close(message);
                Ok(())
            }
            ControlMessageKind::StreamMessageAck => {
                self.broadcast_and_wait(message).await;
                Ok(())
            }
            ControlMessageKind::Unknown(kind) => Err(RuntimeError::UnknownControlKind(kind.clone())),
        }
    }

    fn broadcast_and_close(&self, message: ControlMessage) {
        let subscribers = std::mem::take(&mut *self.drain_done.lock());
        debug!(count = subscribers.len(), "broadcasting drainDone");
        for subscriber in subscribers {
            let delivery = ControlDelivery::new(message.clone(), None);
            tokio::spawn(async move {
                if subscriber.send(delivery).await.is_err() {
                    warn!("drainDone subscriber channel closed");
                }
            });
        }
    }

    async fn broadcast_and_wait(&self, message: ControlMessage) {
        let subscribers = self.stream_ack.lock().clone();
        let deliveries = subscribers.into_iter().map(|subscriber| {
            let message = message.clone();
            async move {
                let (receipt_tx, receipt_rx) = oneshot::channel();
                let delivery = ControlDelivery::new(message, Some(receipt_tx));
                if subscriber.send(delivery).await.is_err() {
                    warn!("streamMessageAck subscriber channel closed");
                    return;
                }
                // Resolves once the subscriber drops the delivery
                let _ = receipt_rx.await;
            }
        });
        join_all(deliveries).await;
    }

    /// Attach the write half of a new control connection.
    pub async fn attach_writer(&self, writer: BoxedWriter) {
        *self.writer.lock().await = Some(writer);
    }

    pub async fn detach_writer(&self) {
        self.writer.lock().await.take();
    }

    /// Send a control message to the wrapper.
    pub async fn write_control_message(&self, message: &ControlMessage) -> Result<(), RuntimeError> {
        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(RuntimeError::NoControlConnection)?;
        nrpc_wire::write_control_message(writer, message).await?;
        Ok(())
    }

    /// Read one control message from the wrapper.
    pub async fn read_control_message<R>(&self, reader: &mut R) -> Result<ControlMessage, ProtocolError>
    where
        R: AsyncBufRead + Unpin + Send + ?Sized,
    {
        nrpc_wire::read_control_message(reader).await
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
