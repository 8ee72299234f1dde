// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::status::ErrorKind;
use mm_core::{AccessLog, CycleResult, MachineHash, MerkleProof};
use serde::{Deserialize, Serialize};

/// The coordinator's reply to one `Request`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success with no payload (`EndSession`, `SessionWriteMemory`,
    /// `SessionStore`, `CommunicateAddress`).
    Void,

    /// `NewSession`'s initial root hash at cycle 0.
    Hash { root_hash: MachineHash },

    /// `SessionRun`'s per-cycle results, one per requested cycle.
    RunResult { results: Vec<CycleResult> },

    /// `SessionStep`'s access log for the stepped instruction.
    StepResult { log: AccessLog },

    /// `SessionReadMemory`'s bytes.
    ReadMemoryResult { data: Vec<u8> },

    /// `SessionGetProof`'s Merkle proof.
    Proof { proof: MerkleProof },

    /// The background job is still running; retry with an identical
    /// request.
    NotReady { message: String },

    /// A terminal error, tagged with the RPC-style status it maps to.
    Error { kind: ErrorKind, message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
