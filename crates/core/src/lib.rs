// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nrpc-core: Domain types shared by the wire codec and the runtime bridge

pub mod macros;

pub mod control;
pub mod event;
pub mod id;
pub mod result;
pub mod statistics;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use control::{ControlMessage, ControlMessageKind};
pub use event::{Event, TriggerInfo};
pub use id::EventId;
pub use result::{BatchOutcome, BatchedResults, EventResult, Response, ResultError, TransportError};
pub use statistics::{Statistics, StatisticsSnapshot};
pub use status::RuntimeStatus;
