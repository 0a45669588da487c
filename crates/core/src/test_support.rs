// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use chrono::{TimeZone, Utc};

use crate::{BatchedResults, Event, EventId, EventResult, Response, TriggerInfo};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for codec property tests.
pub mod strategies {
    use crate::Event;
    use proptest::prelude::*;

    pub fn arb_body() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(any::<u8>(), 0..512)
    }

    pub fn arb_text_body() -> impl Strategy<Value = String> {
        "[ -~]{0,256}"
    }

    pub fn arb_event() -> impl Strategy<Value = Event> {
        (arb_body(), "[a-z0-9-]{1,24}", "[a-z/]{0,16}", 0i64..64).prop_map(
            |(body, id, path, shard)| {
                super::event_with_id(&id, body).path(path).shard_id(shard).num_shards(64)
            },
        )
    }
}

// ── Event factory functions ─────────────────────────────────────────────────

/// Event with a fixed ID and timestamp so encoded output is deterministic.
pub fn event_with_id(id: &str, body: impl Into<Vec<u8>>) -> Event {
    Event::new(body)
        .id(id)
        .timestamp(Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default())
        .trigger(TriggerInfo::new("http", "test-trigger").class("sync"))
}

pub fn http_event(id: &str, body: &str) -> Event {
    event_with_id(id, body.as_bytes().to_vec())
        .content_type("text/plain")
        .method("POST")
        .path("/")
        .url("http://localhost/")
}

pub fn batch_events(ids: &[&str]) -> Vec<Event> {
    ids.iter().map(|id| http_event(id, id)).collect()
}

// ── Result factory functions ────────────────────────────────────────────────

pub fn ok_result(id: &str, status_code: u16, body: &str) -> EventResult {
    EventResult::ok(
        Some(EventId::from(id)),
        Response::new(status_code, body.as_bytes().to_vec()).content_type("text/plain"),
    )
}

/// Echo results for the given IDs, body equal to the ID.
pub fn echo_results(ids: &[&str]) -> BatchedResults {
    BatchedResults::new(ids.iter().map(|id| ok_result(id, 200, id)).collect())
}
