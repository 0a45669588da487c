// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nrpc-runtime: bridge between a function processor and an
//! out-of-process language wrapper.
//!
//! A [`Runtime`] owns one wrapper process and the socket connections it
//! speaks over. Events go out on the event connection; results, logs,
//! metrics, and the start signal come back on it. Wrappers that support
//! control communication get a second connection whose messages are fanned
//! out by the [`ControlMessageBroker`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod env;
mod error;
pub mod logger;
pub mod process;
mod runtime;
pub mod wrapper;

pub use broker::{ControlDelivery, ControlMessageBroker};
pub use config::{FunctionConfig, RuntimeConfig, TimeoutConfig, WrapperConfig, WrapperKind};
pub use connection::{ConnectionManager, ControlConnection, EventConnection, SocketType};
pub use dispatch::{correlate, first_response, EventOutcome};
pub use error::RuntimeError;
pub use logger::{FunctionLogger, TracingLogger};
pub use runtime::{FatalEvent, Runtime};
pub use wrapper::{FunctionEnv, Wrapper, WrapperAddresses};
