// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;

#[derive(Default)]
struct Recorder {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl FunctionLogger for Recorder {
    fn log(&self, level: LogLevel, message: &str, _with: &Map<String, Value>) {
        self.lines.lock().push((level, message.to_string()));
    }
}

#[yare::parameterized(
    critical = { "critical", LogLevel::Error },
    warning  = { "warning", LogLevel::Warn },
    info     = { "info", LogLevel::Info },
    trace    = { "trace", LogLevel::Debug },
)]
fn emit_maps_wrapper_level(level: &str, expected: LogLevel) {
    let recorder = Recorder::default();
    let record = LogRecord { level: level.to_string(), message: "m".to_string(), ..Default::default() };
    emit(&recorder, &record);
    assert_eq!(*recorder.lines.lock(), vec![(expected, "m".to_string())]);
}

#[test]
fn tracing_logger_accepts_every_level() {
    let logger = TracingLogger::new("fn");
    let with = Map::new();
    for level in [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug] {
        logger.log(level, "hello", &with);
    }
}
