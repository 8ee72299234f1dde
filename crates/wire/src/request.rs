// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mm_core::{MachineRequest, MemoryRange, MemoryWrite, ProofTarget, SessionId, WorkerAddress};
use serde::{Deserialize, Serialize};

/// Everything a client can ask the coordinator, across both the
/// high-level (client-facing) and low-level (worker-facing) services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    // ---- high-level service ----
    NewSession {
        session_id: SessionId,
        machine_req: MachineRequest,
        #[serde(default)]
        force: bool,
    },

    EndSession {
        session_id: SessionId,
    },

    SessionRun {
        session_id: SessionId,
        /// Non-empty, strictly ascending target cycles.
        final_cycles: Vec<u64>,
    },

    SessionStep {
        session_id: SessionId,
        initial_cycle: u64,
    },

    SessionReadMemory {
        session_id: SessionId,
        cycle: u64,
        range: MemoryRange,
    },

    SessionWriteMemory {
        session_id: SessionId,
        cycle: u64,
        write: MemoryWrite,
    },

    SessionGetProof {
        session_id: SessionId,
        cycle: u64,
        target: ProofTarget,
    },

    SessionStore {
        session_id: SessionId,
        dest_path: String,
    },

    // ---- low-level (worker-facing) service ----
    /// The check-in: a worker announcing its RPC address.
    CommunicateAddress {
        session_id: SessionId,
        address: WorkerAddress,
    },
}

impl Request {
    /// The session id every request variant carries, used by the job
    /// dispatcher and by routing/logging. `CommunicateAddress` also carries
    /// one, since check-ins are keyed by session like everything else.
    pub fn session_id(&self) -> &SessionId {
        match self {
            Request::NewSession { session_id, .. }
            | Request::EndSession { session_id }
            | Request::SessionRun { session_id, .. }
            | Request::SessionStep { session_id, .. }
            | Request::SessionReadMemory { session_id, .. }
            | Request::SessionWriteMemory { session_id, .. }
            | Request::SessionGetProof { session_id, .. }
            | Request::SessionStore { session_id, .. }
            | Request::CommunicateAddress { session_id, .. } => session_id,
        }
    }

    /// Whether this request belongs to the dispatcher's at-most-one-job
    /// discipline. `CommunicateAddress` bypasses the dispatcher entirely —
    /// it is handled synchronously by the `CheckinService` (§4.3).
    pub fn is_dispatched(&self) -> bool {
        !matches!(self, Request::CommunicateAddress { .. })
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
