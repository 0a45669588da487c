// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` owns process termination and the runtime is
//! always stopped first.

use std::fmt;

use nrpc_runtime::FatalEvent;

/// Invalid configuration.
pub const EXIT_CONFIG: i32 = 2;
/// The wrapper died or disconnected while events were being served.
pub const EXIT_WRAPPER: i32 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn fatal(event: &FatalEvent) -> Self {
        match event {
            FatalEvent::WrapperExited { pid, status } => {
                Self::new(EXIT_WRAPPER, format!("wrapper process {pid} exited unexpectedly ({status})"))
            }
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
