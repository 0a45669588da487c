// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response lines written to stdout, one JSON object per event.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::ValueEnum;
use nrpc_core::{EventId, Response};
use nrpc_runtime::RuntimeError;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Toml,
    Json,
}

/// What happened to one input event.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseLine {
    Ok {
        event_id: String,
        status_code: u16,
        content_type: String,
        headers: Map<String, Value>,
        body: String,
        body_encoding: &'static str,
    },
    Error {
        event_id: String,
        status_code: u16,
        error: String,
        retryable: bool,
    },
}

impl ResponseLine {
    pub fn ok(event_id: &EventId, response: Response) -> Self {
        let (body, body_encoding) = match String::from_utf8(response.body) {
            Ok(text) => (text, "text"),
            Err(e) => (STANDARD.encode(e.into_bytes()), "base64"),
        };
        ResponseLine::Ok {
            event_id: event_id.to_string(),
            status_code: response.status_code,
            content_type: response.content_type,
            headers: response.headers,
            body,
            body_encoding,
        }
    }

    pub fn error(event_id: &EventId, error: &RuntimeError) -> Self {
        ResponseLine::Error {
            event_id: event_id.to_string(),
            status_code: error.status_code(),
            error: error.to_string(),
            retryable: error.is_retryable(),
        }
    }

    pub fn from_result(event_id: &EventId, result: Result<Response, RuntimeError>) -> Self {
        match result {
            Ok(response) => Self::ok(event_id, response),
            Err(e) => Self::error(event_id, &e),
        }
    }

    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string(self)?);
        Ok(())
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
