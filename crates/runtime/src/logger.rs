// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sinks for log records emitted by user code inside the wrapper.

use nrpc_wire::{LogLevel, LogRecord};
use serde_json::{Map, Value};

/// Receives wrapper log records for the event currently being processed.
pub trait FunctionLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, with: &Map<String, Value>);
}

/// Default logger: forwards records as `tracing` events.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    function: String,
}

impl TracingLogger {
    pub fn new(function: impl Into<String>) -> Self {
        Self { function: function.into() }
    }
}

impl FunctionLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, with: &Map<String, Value>) {
        let function = self.function.as_str();
        let with = Value::Object(with.clone());
        match level {
            LogLevel::Error => tracing::error!(function, %with, "{message}"),
            LogLevel::Warn => tracing::warn!(function, %with, "{message}"),
            LogLevel::Info => tracing::info!(function, %with, "{message}"),
            LogLevel::Debug => tracing::debug!(function, %with, "{message}"),
        }
    }
}

/// Route a decoded log frame to `logger`.
pub(crate) fn emit(logger: &dyn FunctionLogger, record: &LogRecord) {
    logger.log(record.log_level(), &record.message, &record.with);
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
