// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A fault-injecting `SessionRegistry`, selected at startup by `--defective`.
//!
//! A test seam, not production behavior (§9): it wraps a real registry and
//! deliberately breaks two of its operations so client-side retry and
//! error-handling paths can be exercised without a flaky real worker.

use async_trait::async_trait;
use mm_core::{
    AccessLog, MachineHash, MachineRequest, MemoryRange, MemoryWrite, MerkleProof, MmError,
    MmResult, ProofTarget, RunSummary, SessionId, WorkerAddress,
};

use super::{CycleOutcome, SessionRegistry, SessionStatus};

/// Wraps any `SessionRegistry` and injects two faults:
/// - `run_session` always fails with `CheckinError`, regardless of input.
/// - `new_session`'s returned root hash is corrupted (bytes reversed).
///
/// Every other operation passes through unchanged.
pub struct DefectiveRegistry<R: SessionRegistry> {
    inner: R,
}

impl<R: SessionRegistry> DefectiveRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: SessionRegistry> SessionRegistry for DefectiveRegistry<R> {
    async fn new_session(
        &self,
        session_id: SessionId,
        machine_req: MachineRequest,
        force: bool,
    ) -> MmResult<MachineHash> {
        let hash = self.inner.new_session(session_id, machine_req, force).await?;
        let corrupted: String = hash.as_str().chars().rev().collect();
        Ok(MachineHash::from_hex(corrupted))
    }

    async fn end_session(&self, session_id: &SessionId) -> MmResult<()> {
        self.inner.end_session(session_id).await
    }

    async fn run_session(
        &self,
        session_id: &SessionId,
        _final_cycles: &[u64],
    ) -> MmResult<Vec<CycleOutcome>> {
        Err(MmError::Checkin(session_id.clone()))
    }

    async fn step_session(
        &self,
        session_id: &SessionId,
        initial_cycle: u64,
    ) -> MmResult<AccessLog> {
        self.inner.step_session(session_id, initial_cycle).await
    }

    async fn read_memory(
        &self,
        session_id: &SessionId,
        cycle: u64,
        range: MemoryRange,
    ) -> MmResult<Vec<u8>> {
        self.inner.read_memory(session_id, cycle, range).await
    }

    async fn write_memory(
        &self,
        session_id: &SessionId,
        cycle: u64,
        write: MemoryWrite,
    ) -> MmResult<()> {
        self.inner.write_memory(session_id, cycle, write).await
    }

    async fn get_proof(
        &self,
        session_id: &SessionId,
        cycle: u64,
        target: ProofTarget,
    ) -> MmResult<MerkleProof> {
        self.inner.get_proof(session_id, cycle, target).await
    }

    async fn store_session(&self, session_id: &SessionId, dest_path: &str) -> MmResult<()> {
        self.inner.store_session(session_id, dest_path).await
    }

    async fn checkin(&self, session_id: SessionId, address: WorkerAddress) -> MmResult<()> {
        self.inner.checkin(session_id, address).await
    }

    fn status(&self, session_id: &SessionId) -> MmResult<SessionStatus> {
        self.inner.status(session_id)
    }

    fn begin_shutdown(&self) {
        self.inner.begin_shutdown();
    }

    fn is_shutting_down(&self) -> bool {
        self.inner.is_shutting_down()
    }

    async fn shutdown_all(&self) {
        self.inner.shutdown_all().await;
    }
}

#[cfg(test)]
#[path = "defective_tests.rs"]
mod tests;
