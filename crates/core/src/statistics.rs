// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Function duration statistics fed by wrapper metric frames.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lock-free accumulator of reported durations.
#[derive(Debug, Default)]
pub struct Statistics {
    duration_ms_sum: AtomicU64,
    duration_ms_count: AtomicU64,
}

/// Point-in-time copy of [`Statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub duration_ms_sum: u64,
    pub duration_ms_count: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation duration, rounded to the nearest millisecond.
    pub fn update(&self, duration_secs: f64) {
        let ms = (duration_secs * 1000.0).round().max(0.0) as u64;
        self.duration_ms_sum.fetch_add(ms, Ordering::Relaxed);
        self.duration_ms_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            duration_ms_sum: self.duration_ms_sum.load(Ordering::Relaxed),
            duration_ms_count: self.duration_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl StatisticsSnapshot {
    /// Field-wise difference `self - prev`, saturating at zero.
    pub fn diff_from(&self, prev: &StatisticsSnapshot) -> StatisticsSnapshot {
        StatisticsSnapshot {
            duration_ms_sum: self.duration_ms_sum.saturating_sub(prev.duration_ms_sum),
            duration_ms_count: self.duration_ms_count.saturating_sub(prev.duration_ms_count),
        }
    }

    /// Mean duration in milliseconds, or `None` when nothing was recorded.
    pub fn mean_ms(&self) -> Option<f64> {
        (self.duration_ms_count > 0)
            .then(|| self.duration_ms_sum as f64 / self.duration_ms_count as f64)
    }
}

#[cfg(test)]
#[path = "statistics_tests.rs"]
mod tests;
