// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Lifecycle state of a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeStatus {
    #[default]
    Initializing,
    Ready,
    Error,
    Stopped,
}

crate::simple_display! {
    RuntimeStatus {
        Initializing => "initializing",
        Ready => "ready",
        Error => "error",
        Stopped => "stopped",
    }
}

impl RuntimeStatus {
    pub fn is_ready(self) -> bool {
        self == RuntimeStatus::Ready
    }
}
