// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event input lines.
//!
//! Each non-blank input line is one JSON object:
//!
//! ```json
//! {"id": "e1", "body": "hello", "content_type": "text/plain", "headers": {"x-a": "1"}}
//! ```
//!
//! `body` may be a string (sent as-is) or any JSON value (serialized, and
//! objects are also passed to the wrapper as a parsed body). Binary bodies
//! use `body_base64` instead.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nrpc_core::{Event, TriggerInfo};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid event line: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid body_base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("event has both body and body_base64")]
    ConflictingBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventInput {
    pub id: Option<String>,
    pub body: Option<Value>,
    pub body_base64: Option<String>,
    pub content_type: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub url: Option<String>,
    pub headers: Map<String, Value>,
    pub fields: Map<String, Value>,
}

impl EventInput {
    pub fn parse(line: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Build the event, tagging it with `trigger`. Missing IDs are generated.
    pub fn into_event(self, trigger: &TriggerInfo) -> Result<Event, InputError> {
        let (body, body_object, default_type) = match (self.body, self.body_base64) {
            (Some(_), Some(_)) => return Err(InputError::ConflictingBody),
            (None, Some(encoded)) => {
                (STANDARD.decode(encoded.as_bytes())?, None, "application/octet-stream")
            }
            (Some(Value::String(text)), None) => (text.into_bytes(), None, "text/plain"),
            (Some(Value::Object(object)), None) => {
                (serde_json::to_vec(&object)?, Some(object), "application/json")
            }
            (Some(other), None) => (serde_json::to_vec(&other)?, None, "application/json"),
            (None, None) => (Vec::new(), None, ""),
        };

        let mut event = Event::new(body)
            .trigger(trigger.clone())
            .content_type(self.content_type.unwrap_or_else(|| default_type.to_string()))
            .method(self.method.unwrap_or_else(|| "POST".to_string()))
            .path(self.path.unwrap_or_else(|| "/".to_string()));
        if let Some(id) = self.id {
            event = event.id(id);
        }
        if let Some(url) = self.url {
            event = event.url(url);
        }
        if let Some(object) = body_object {
            event = event.body_object(object);
        }
        event.headers = self.headers;
        event.fields = self.fields;
        Ok(event)
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
