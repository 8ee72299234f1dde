// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `SessionRegistry`: owns all session state and hides the
//! snapshot/rollback/recreate decision logic behind `runMachineToDesiredCycle`.

mod cycle_seek;
mod defective;
mod production;
mod session;

pub use defective::DefectiveRegistry;
pub use production::ProductionRegistry;
pub use session::{SessionStatus, CHECKIN_WAIT_TIMEOUT};

use async_trait::async_trait;
use mm_core::{
    AccessLog, MachineHash, MachineRequest, MemoryRange, MemoryWrite, MerkleProof, MmResult,
    ProofTarget, RunSummary, SessionId, WorkerAddress,
};

/// One entry of `SessionRun`'s result list.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub cycle: u64,
    pub summary: RunSummary,
    pub root_hash: MachineHash,
}

/// The registry's public interface (§4.1). `ProductionRegistry` is the real
/// implementation; `DefectiveRegistry` is a fault-injecting test seam
/// selected at startup by `--defective` — never reached in production.
#[async_trait]
pub trait SessionRegistry: Send + Sync + 'static {
    async fn new_session(
        &self,
        session_id: SessionId,
        machine_req: MachineRequest,
        force: bool,
    ) -> MmResult<MachineHash>;

    async fn end_session(&self, session_id: &SessionId) -> MmResult<()>;

    async fn run_session(
        &self,
        session_id: &SessionId,
        final_cycles: &[u64],
    ) -> MmResult<Vec<CycleOutcome>>;

    async fn step_session(&self, session_id: &SessionId, initial_cycle: u64)
        -> MmResult<AccessLog>;

    async fn read_memory(
        &self,
        session_id: &SessionId,
        cycle: u64,
        range: MemoryRange,
    ) -> MmResult<Vec<u8>>;

    async fn write_memory(
        &self,
        session_id: &SessionId,
        cycle: u64,
        write: MemoryWrite,
    ) -> MmResult<()>;

    async fn get_proof(
        &self,
        session_id: &SessionId,
        cycle: u64,
        target: ProofTarget,
    ) -> MmResult<MerkleProof>;

    async fn store_session(&self, session_id: &SessionId, dest_path: &str) -> MmResult<()>;

    /// Handle an inbound check-in: `(session_id, address)` from a freshly
    /// spawned or restarted worker. Bypasses the job dispatcher entirely —
    /// handled synchronously by the `CheckinService` (§4.3).
    async fn checkin(&self, session_id: SessionId, address: WorkerAddress) -> MmResult<()>;

    /// Read-only status snapshot, for diagnostics/logging only.
    fn status(&self, session_id: &SessionId) -> MmResult<SessionStatus>;

    /// Begin coordinator shutdown: subsequent dispatcher entries must reject
    /// with `ShuttingDown` once this returns.
    fn begin_shutdown(&self);

    fn is_shutting_down(&self) -> bool;

    /// Drain every live session's worker, best-effort, for the Lifecycle
    /// coordinator (§4.4). Individual failures are logged, never propagated.
    async fn shutdown_all(&self);
}
