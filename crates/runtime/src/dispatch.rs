// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping wrapper results back onto the events that produced them.

use std::collections::HashMap;

use nrpc_core::{BatchedResults, Event, EventId, EventResult, Response, ResultError};
use tracing::warn;

use crate::RuntimeError;

/// Outcome for one input event of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub event_id: EventId,
    pub outcome: Result<Response, ResultError>,
}

/// Unwrap the first result of a single-event call.
pub fn first_response(results: BatchedResults) -> Result<Response, RuntimeError> {
    let first = results.into_iter().next().ok_or(RuntimeError::EmptyResults)?;
    first.outcome.map_err(RuntimeError::from)
}

/// Pair each input event with its result.
///
/// Results carrying an `event_id` are matched by ID. Results without one
/// fill the remaining events in order. Results matching no event are
/// dropped with a warning; events left without a result get
/// [`ResultError::MissingResult`].
///
/// An anonymous [`ResultError::RuntimeRestarted`] fails the whole call, so
/// every event it leaves unresolved is reported as restarted too.
pub fn correlate(events: &[Event], results: BatchedResults) -> Vec<EventOutcome> {
    let mut by_id: HashMap<EventId, EventResult> = HashMap::new();
    let mut anonymous = Vec::new();
    let mut restarted = false;

    for result in results {
        match result.event_id.clone() {
            Some(id) => {
                if let Some(previous) = by_id.insert(id.clone(), result) {
                    warn!(event_id = %id, ?previous, "duplicate result for event, keeping the last");
                }
            }
            None => {
                restarted |= matches!(result.outcome, Err(ResultError::RuntimeRestarted));
                anonymous.push(result);
            }
        }
    }

    let mut anonymous = anonymous.into_iter();
    let outcomes = events
        .iter()
        .map(|event| {
            let result = by_id.remove(&event.id).or_else(|| anonymous.next());
            EventOutcome {
                event_id: event.id.clone(),
                outcome: match result {
                    Some(result) => result.outcome,
                    None if restarted => Err(ResultError::RuntimeRestarted),
                    None => Err(ResultError::MissingResult(event.id.clone())),
                },
            }
        })
        .collect();

    for (id, result) in by_id {
        warn!(event_id = %id, ?result, "dropping result for unknown event");
    }
    for result in anonymous {
        warn!(?result, "dropping surplus result");
    }

    outcomes
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
