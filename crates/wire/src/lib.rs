// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between the runtime and a wrapper process.
//!
//! Outbound events are written by an [`EventEncoder`]: one JSON document per
//! line, or a 4-byte big-endian length prefix followed by MessagePack.
//! Inbound traffic on the event socket is newline-delimited, each line
//! starting with a one-byte tag (see [`Frame`]). The control socket carries
//! one JSON [`ControlMessage`](nrpc_core::ControlMessage) per line.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod control;
mod encoder;
mod error;
mod frame;
mod framing;

pub use control::{read_control_message, write_control_message};
pub use encoder::{EncodingKind, EventEncoder, JsonEncoder, MsgpackEncoder, Payload, WireEvent};
pub use error::ProtocolError;
pub use frame::{decode_frame, decode_results, Frame, LogLevel, LogRecord};
pub use framing::{read_message, write_message, MAX_MESSAGE_SIZE};

#[cfg(test)]
mod property_tests;
