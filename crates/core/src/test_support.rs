// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::hash::MachineHash;
use crate::run::{CycleResult, RunSummary};

pub fn fixture_hash(tag: &str) -> MachineHash {
    MachineHash::from_hex(format!("{:0>8}", tag))
}

pub fn fixture_cycle_result(cycle: u64) -> CycleResult {
    CycleResult {
        cycle,
        summary: RunSummary(serde_json::json!({ "halted": false })),
        root_hash: fixture_hash(&cycle.to_string()),
    }
}
