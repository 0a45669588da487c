// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound frames on the event socket.
//!
//! Each newline-terminated line starts with a one-byte tag:
//! `r` results, `m` metric, `l` log record, `s` start.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nrpc_core::{
    BatchOutcome, BatchedResults, EventId, EventResult, Response, ResultError, TransportError,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ProtocolError;

/// A decoded line from the wrapper.
#[derive(Debug)]
pub enum Frame {
    /// `r`: one result or a batch. Unparseable payloads decode to a
    /// batch-level [`TransportError::Decode`].
    Result(BatchOutcome),
    /// `m`: invocation duration in seconds (never zero).
    Metric { duration_secs: f64 },
    /// `l`: a log record emitted by user code.
    Log(LogRecord),
    /// `s`: the wrapper finished initializing.
    Start,
    /// Any other tag.
    Unknown(u8),
}

/// Severity of a wrapper log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Map a wrapper level string. Unrecognized levels are debug.
    pub fn from_wrapper(level: &str) -> Self {
        match level {
            "error" | "critical" | "fatal" => LogLevel::Error,
            "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

nrpc_core::simple_display! {
    LogLevel {
        Error => "error",
        Warn => "warn",
        Info => "info",
        Debug => "debug",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub datetime: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub with: Map<String, Value>,
}

impl LogRecord {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_wrapper(&self.level)
    }
}

#[derive(Deserialize)]
struct WireMetric {
    #[serde(default)]
    duration: f64,
}

#[derive(Deserialize)]
struct WireResult {
    #[serde(default)]
    status_code: u16,
    #[serde(default)]
    content_type: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    body_encoding: String,
    #[serde(default)]
    headers: Map<String, Value>,
    #[serde(default)]
    event_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireResults {
    Batch(Vec<WireResult>),
    Single(WireResult),
}

impl WireResult {
    fn into_event_result(self) -> EventResult {
        let event_id = self.event_id.filter(|id| !id.is_empty()).map(EventId::from);
        let body = match self.body_encoding.as_str() {
            "text" => Ok(self.body.into_bytes()),
            "base64" => STANDARD
                .decode(self.body.as_bytes())
                .map_err(|e| ResultError::InvalidBase64(e.to_string())),
            other => Err(ResultError::UnknownBodyEncoding(other.to_string())),
        };
        let outcome = body.map(|body| Response {
            status_code: self.status_code,
            content_type: self.content_type,
            headers: self.headers,
            body,
        });
        EventResult { event_id, outcome }
    }
}

/// Decode the payload of an `r` frame.
pub fn decode_results(payload: &[u8]) -> BatchOutcome {
    let wire: WireResults =
        serde_json::from_slice(payload).map_err(|e| TransportError::Decode(e.to_string()))?;
    let results = match wire {
        WireResults::Batch(items) => items.into_iter().map(WireResult::into_event_result).collect(),
        WireResults::Single(item) => vec![item.into_event_result()],
    };
    Ok(BatchedResults::new(results))
}

/// Decode one line (with or without its trailing newline).
pub fn decode_frame(line: &[u8]) -> Result<Frame, ProtocolError> {
    let line = trim_line_end(line);
    let Some((&tag, payload)) = line.split_first() else {
        return Err(ProtocolError::EmptyFrame);
    };

    match tag {
        b'r' => Ok(Frame::Result(decode_results(payload))),
        b'm' => {
            let metric: WireMetric = serde_json::from_slice(payload)?;
            if metric.duration == 0.0 {
                return Err(ProtocolError::MissingDuration);
            }
            Ok(Frame::Metric { duration_secs: metric.duration })
        }
        b'l' => Ok(Frame::Log(serde_json::from_slice(payload)?)),
        b's' => Ok(Frame::Start),
        other => Ok(Frame::Unknown(other)),
    }
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
