// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Out-of-band control messages exchanged with the wrapper.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a control message.
///
/// Serialized as its wire string; unrecognized strings are kept verbatim
/// so the broker can reject them with a meaningful error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ControlMessageKind {
    /// Wrapper finished draining in-flight work.
    DrainDone,
    /// Wrapper acknowledged a stream message (offset commit).
    StreamMessageAck,
    Unknown(String),
}

impl ControlMessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            ControlMessageKind::DrainDone => "drainDone",
            ControlMessageKind::StreamMessageAck => "streamMessageAck",
            ControlMessageKind::Unknown(s) => s,
        }
    }
}

impl From<String> for ControlMessageKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "drainDone" => ControlMessageKind::DrainDone,
            "streamMessageAck" => ControlMessageKind::StreamMessageAck,
            _ => ControlMessageKind::Unknown(s),
        }
    }
}

impl From<&str> for ControlMessageKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ControlMessageKind> for String {
    fn from(kind: ControlMessageKind) -> Self {
        match kind {
            ControlMessageKind::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ControlMessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "Kind")]
    pub kind: ControlMessageKind,
    #[serde(rename = "Attributes", default)]
    pub attributes: Map<String, Value>,
}

impl ControlMessage {
    pub fn new(kind: impl Into<ControlMessageKind>) -> Self {
        Self { kind: kind.into(), attributes: Map::new() }
    }

    pub fn drain_done() -> Self {
        Self::new(ControlMessageKind::DrainDone)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
