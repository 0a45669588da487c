// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events delivered to the wrapper process.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::id::EventId;

/// Trigger that produced an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerInfo {
    pub class: String,
    pub kind: String,
    pub name: String,
}

impl TriggerInfo {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self { class: String::new(), kind: kind.into(), name: name.into() }
    }

    crate::setters! {
        into { class: String }
    }
}

/// A single function invocation request.
///
/// `body` holds the raw payload. When `body_object` is set (e.g. a cloud
/// event carrying structured data) the encoder embeds it instead of the
/// base64 form of `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub content_type: String,
    pub trigger: TriggerInfo,
    pub fields: Map<String, Value>,
    pub headers: Map<String, Value>,
    pub method: String,
    pub path: String,
    pub url: String,
    pub body: Vec<u8>,
    pub body_object: Option<Map<String, Value>>,
    pub timestamp: DateTime<Utc>,
    pub shard_id: i64,
    pub num_shards: i64,
    pub event_type: String,
    pub type_version: String,
    pub version: String,
}

impl Event {
    /// Create an event with a fresh ID, the current time, and the given body.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            id: EventId::new(),
            content_type: String::new(),
            trigger: TriggerInfo::default(),
            fields: Map::new(),
            headers: Map::new(),
            method: String::new(),
            path: String::new(),
            url: String::new(),
            body: body.into(),
            body_object: None,
            timestamp: Utc::now(),
            shard_id: 0,
            num_shards: 0,
            event_type: String::new(),
            type_version: String::new(),
            version: String::new(),
        }
    }

    crate::setters! {
        into {
            id: EventId,
            content_type: String,
            method: String,
            path: String,
            url: String,
            event_type: String,
            type_version: String,
            version: String,
        }
        set {
            trigger: TriggerInfo,
            timestamp: DateTime<Utc>,
            shard_id: i64,
            num_shards: i64,
        }
        option { body_object: Map<String, Value> }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Parse the body as JSON and keep it as the structured body when it is an object.
    ///
    /// Non-object or unparseable bodies leave the event unchanged.
    pub fn with_parsed_body_object(mut self) -> Self {
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&self.body) {
            self.body_object = Some(map);
        }
        self
    }

    /// Body length in bytes, as reported in the `size` wire field.
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Timestamp as whole seconds since the Unix epoch (UTC).
    pub fn timestamp_secs(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
