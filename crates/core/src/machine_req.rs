// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine creation parameters.
//!
//! Opaque to the coordinator beyond being retained verbatim: it is handed to
//! `MachineClient::create_machine` on `NewSession` and replayed unchanged on
//! every `recreate`. The coordinator never inspects its contents, so it is
//! modeled as an arbitrary JSON value rather than a typed emulator config —
//! the emulator's configuration schema is the worker's concern, not this
//! coordinator's.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineRequest(pub serde_json::Value);

impl MachineRequest {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl MachineRequest {
    /// A minimal request sufficient for tests that don't care about its shape.
    pub fn fixture() -> Self {
        Self(serde_json::json!({ "ram_length": 1 << 20 }))
    }
}
