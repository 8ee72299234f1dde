// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Results of driving a machine forward.

use crate::hash::MachineHash;
use serde::{Deserialize, Serialize};

/// Opaque per-run bookkeeping the worker reports back (instructions retired,
/// halt status, etc). The coordinator forwards it without interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary(pub serde_json::Value);

/// One entry of `RunSession`'s result list: the cycle reached and the
/// machine's root hash once there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle: u64,
    pub summary: RunSummary,
    pub root_hash: MachineHash,
}

/// Opaque per-instruction access log returned by `SessionStep`. The
/// emulator's log format is the worker's concern; the coordinator only
/// stores and forwards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLog(pub serde_json::Value);
