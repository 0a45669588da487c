// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Results reported by the wrapper process.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::id::EventId;

/// Status code of the synthetic result emitted when a runtime is restarted
/// or stopped while a call is in flight.
pub const RESTARTED_STATUS_CODE: u16 = 408;

/// A successful function response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub content_type: String,
    pub headers: Map<String, Value>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status_code, body: body.into(), ..Default::default() }
    }

    crate::setters! {
        into { content_type: String }
        set { headers: Map<String, Value> }
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Failure of one result within a batch. Siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultError {
    #[error("Unknown body encoding - {0:?}")]
    UnknownBodyEncoding(String),

    #[error("invalid base64 body: {0}")]
    InvalidBase64(String),

    #[error("Runtime restarted")]
    RuntimeRestarted,

    #[error("no result received for event {0}")]
    MissingResult(EventId),
}

impl ResultError {
    pub fn status_code(&self) -> u16 {
        match self {
            ResultError::RuntimeRestarted => RESTARTED_STATUS_CODE,
            _ => 500,
        }
    }
}

/// One entry of a batch: the echoed event ID (when present) and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct EventResult {
    pub event_id: Option<EventId>,
    pub outcome: Result<Response, ResultError>,
}

impl EventResult {
    pub fn ok(event_id: Option<EventId>, response: Response) -> Self {
        Self { event_id, outcome: Ok(response) }
    }

    pub fn err(event_id: Option<EventId>, error: ResultError) -> Self {
        Self { event_id, outcome: Err(error) }
    }

    /// Synthetic result pushed when the read loop is cancelled mid-call.
    pub fn restarted() -> Self {
        Self::err(None, ResultError::RuntimeRestarted)
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Ordered results of one dispatched frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchedResults {
    pub results: Vec<EventResult>,
}

impl BatchedResults {
    pub fn new(results: Vec<EventResult>) -> Self {
        Self { results }
    }

    pub fn single(result: EventResult) -> Self {
        Self { results: vec![result] }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl IntoIterator for BatchedResults {
    type Item = EventResult;
    type IntoIter = std::vec::IntoIter<EventResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Failure of a whole batch on the event connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to read from connection: {0}")]
    Read(String),

    #[error("failed to decode results: {0}")]
    Decode(String),
}

/// What the event read loop hands to the waiting call.
pub type BatchOutcome = Result<BatchedResults, TransportError>;

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
