// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound event encoders.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nrpc_core::{Event, TriggerInfo};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::framing::write_message;
use crate::ProtocolError;

/// What a single encode call writes: one event or an ordered batch.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Single(&'a Event),
    Batch(&'a [Event]),
}

impl Payload<'_> {
    pub fn len(&self) -> usize {
        match self {
            Payload::Single(_) => 1,
            Payload::Batch(events) => events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serialization format negotiated per wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    #[default]
    Json,
    Msgpack,
}

nrpc_core::simple_display! {
    EncodingKind {
        Json => "json",
        Msgpack => "msgpack",
    }
}

impl EncodingKind {
    /// Build the encoder for this format on top of `writer`.
    pub fn encoder<W>(self, writer: W) -> Box<dyn EventEncoder>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        match self {
            EncodingKind::Json => Box::new(JsonEncoder::new(writer)),
            EncodingKind::Msgpack => Box::new(MsgpackEncoder::new(writer)),
        }
    }
}

/// Writes one frame per call to the wrapper's event socket.
#[async_trait]
pub trait EventEncoder: Send {
    async fn encode(&mut self, payload: Payload<'_>) -> Result<(), ProtocolError>;

    fn kind(&self) -> EncodingKind;
}

#[derive(Debug, Serialize)]
struct WireTrigger<'a> {
    class: &'a str,
    kind: &'a str,
    name: &'a str,
}

impl<'a> From<&'a TriggerInfo> for WireTrigger<'a> {
    fn from(t: &'a TriggerInfo) -> Self {
        Self { class: &t.class, kind: &t.kind, name: &t.name }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireBody<'a> {
    Object(&'a Map<String, Value>),
    Base64(String),
}

/// Serialized form of an [`Event`].
#[derive(Debug, Serialize)]
pub struct WireEvent<'a> {
    #[serde(rename = "content-type")]
    content_type: &'a str,
    trigger: WireTrigger<'a>,
    fields: &'a Map<String, Value>,
    headers: &'a Map<String, Value>,
    id: &'a str,
    method: &'a str,
    path: &'a str,
    size: usize,
    timestamp: i64,
    url: &'a str,
    shard_id: i64,
    num_shards: i64,
    #[serde(rename = "type")]
    event_type: &'a str,
    type_version: &'a str,
    version: &'a str,
    body: WireBody<'a>,
}

impl<'a> From<&'a Event> for WireEvent<'a> {
    fn from(event: &'a Event) -> Self {
        let body = match &event.body_object {
            Some(object) => WireBody::Object(object),
            None => WireBody::Base64(STANDARD.encode(&event.body)),
        };
        Self {
            content_type: &event.content_type,
            trigger: WireTrigger::from(&event.trigger),
            fields: &event.fields,
            headers: &event.headers,
            id: event.id.as_str(),
            method: &event.method,
            path: &event.path,
            size: event.size(),
            timestamp: event.timestamp_secs(),
            url: &event.url,
            shard_id: event.shard_id,
            num_shards: event.num_shards,
            event_type: &event.event_type,
            type_version: &event.type_version,
            version: &event.version,
            body,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum WirePayload<'a> {
    Single(WireEvent<'a>),
    Batch(Vec<WireEvent<'a>>),
}

impl<'a> From<Payload<'a>> for WirePayload<'a> {
    fn from(payload: Payload<'a>) -> Self {
        match payload {
            Payload::Single(event) => WirePayload::Single(event.into()),
            Payload::Batch(events) => WirePayload::Batch(events.iter().map(Into::into).collect()),
        }
    }
}

/// Newline-terminated JSON, one document per frame.
pub struct JsonEncoder<W> {
    writer: W,
}

impl<W> JsonEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> EventEncoder for JsonEncoder<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn encode(&mut self, payload: Payload<'_>) -> Result<(), ProtocolError> {
        let mut buf = serde_json::to_vec(&WirePayload::from(payload))?;
        buf.push(b'\n');
        self.writer.write_all(&buf).await?;
        self.writer.flush().await?;
        Ok(())
    }

    fn kind(&self) -> EncodingKind {
        EncodingKind::Json
    }
}

/// Length-prefixed MessagePack with named fields.
pub struct MsgpackEncoder<W> {
    writer: W,
}

impl<W> MsgpackEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> EventEncoder for MsgpackEncoder<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn encode(&mut self, payload: Payload<'_>) -> Result<(), ProtocolError> {
        let buf = rmp_serde::to_vec_named(&WirePayload::from(payload))?;
        write_message(&mut self.writer, &buf).await
    }

    fn kind(&self) -> EncodingKind {
        EncodingKind::Msgpack
    }
}

#[cfg(test)]
#[path = "encoder_tests.rs"]
mod tests;
