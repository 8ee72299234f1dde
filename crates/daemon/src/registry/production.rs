// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The production `SessionRegistry`: real worker coordination through
//! `MachineClient` and `WorkerLauncher`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mm_core::{
    AccessLog, Clock, MachineHash, MachineRequest, MemoryRange, MemoryWrite, MerkleProof, MmError,
    MmResult, ProofTarget, RunSummary, SessionId, WorkerAddress,
};
use mm_machine::{MachineClient, MachineError, WorkerLauncher};
use parking_lot::Mutex;
use tracing::{info, warn};

use super::cycle_seek::{self, SeekDecision};
use super::session::SessionHandle;
use super::{CycleOutcome, SessionRegistry, SessionStatus};

/// Owns the session map (the registry's "global lock", §5) and the two
/// capabilities every session-mutating operation drives: the worker RPC
/// stub and the process launcher.
pub struct ProductionRegistry<C: Clock> {
    sessions: Mutex<HashMap<SessionId, Arc<SessionHandle>>>,
    machine: Arc<dyn MachineClient>,
    launcher: Arc<dyn WorkerLauncher>,
    /// The coordinator's own check-in listening address, handed to every
    /// spawned worker so it knows where to announce itself.
    checkin_addr: String,
    clock: C,
    shutting_down: AtomicBool,
}

impl<C: Clock> ProductionRegistry<C> {
    pub fn new(
        machine: Arc<dyn MachineClient>,
        launcher: Arc<dyn WorkerLauncher>,
        checkin_addr: impl Into<String>,
        clock: C,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            machine,
            launcher,
            checkin_addr: checkin_addr.into(),
            clock,
            shutting_down: AtomicBool::new(false),
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    fn get_handle(&self, session_id: &SessionId) -> MmResult<Arc<SessionHandle>> {
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| MmError::UnknownSession(session_id.clone()))
    }

    fn require_address(&self, handle: &SessionHandle) -> MmResult<WorkerAddress> {
        handle.current_address().ok_or_else(|| MmError::Address {
            session: handle.session_id.clone(),
            reason: "no live worker address".into(),
        })
    }

    /// Worker RPC errors propagate through `AddressError` when they signal
    /// the worker is unreachable (the coordinator's only evidence that the
    /// address it holds is no longer good), otherwise through the generic
    /// path — neither variant gets its own error kind (§7 names no
    /// "worker rejected the call" kind).
    fn wrap(&self, handle: &SessionHandle, err: MachineError) -> MmError {
        match &err {
            MachineError::Unreachable { .. } => {
                MmError::Address { session: handle.session_id.clone(), reason: err.to_string() }
            }
            MachineError::Rejected { .. } => {
                MmError::Other(format!("session {}: {err}", handle.session_id))
            }
        }
    }

    async fn insert_session(
        &self,
        session_id: SessionId,
        machine_req: MachineRequest,
        force: bool,
    ) -> MmResult<Arc<SessionHandle>> {
        let existing = self.sessions.lock().get(&session_id).cloned();
        if let Some(existing) = existing {
            if !force {
                return Err(MmError::SessionIdInUse(session_id));
            }
            if let Some(address) = existing.current_address() {
                let _ = self.machine.shutdown(&address).await;
            }
        }
        let handle = Arc::new(SessionHandle::new(session_id.clone(), machine_req, self.now_ms()));
        self.sessions.lock().insert(session_id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Block on check-in; on timeout, remove the session and hard-kill any
    /// surviving subprocesses (§4.1 step 5).
    async fn await_checkin_or_cleanup(&self, handle: &SessionHandle) -> MmResult<WorkerAddress> {
        match handle.await_checkin().await {
            Some(address) => Ok(address),
            None => {
                self.sessions.lock().remove(&handle.session_id);
                self.launcher.kill_all(&handle.session_id).await;
                tracing::error!(
                    session_id = %handle.session_id,
                    timeout_secs = super::CHECKIN_WAIT_TIMEOUT.as_secs(),
                    "worker failed to check in within timeout; session removed"
                );
                Err(MmError::Checkin(handle.session_id.clone()))
            }
        }
    }

    /// Snapshot the live worker. Snapshotting a Cartesi-style machine forks
    /// the process, so — like rollback — it always terminates the current
    /// worker and re-runs the check-in rendezvous, even right after
    /// `NewSession` creates a session at cycle 0.
    async fn do_snapshot(&self, handle: &SessionHandle) -> MmResult<()> {
        let address = self.require_address(handle)?;
        self.machine.snapshot(&address).await.map_err(|e| self.wrap(handle, e))?;
        handle.clear_address(self.now_ms());
        let new_address = self.await_checkin_or_cleanup(handle).await?;
        handle.record_checkin(new_address, self.now_ms());
        let cycle = handle.cycle();
        handle.state.lock().snapshot_cycle = Some(cycle);
        info!(session_id = %handle.session_id, cycle, "snapshot committed");
        Ok(())
    }

    async fn do_rollback(&self, handle: &SessionHandle) -> MmResult<()> {
        let snapshot_cycle = handle
            .snapshot_cycle()
            .ok_or_else(|| MmError::Rollback(handle.session_id.clone()))?;
        let address = self.require_address(handle)?;
        self.machine.rollback(&address).await.map_err(|e| self.wrap(handle, e))?;
        handle.clear_address(self.now_ms());
        let new_address = self.await_checkin_or_cleanup(handle).await?;
        handle.record_checkin(new_address, self.now_ms());
        {
            let mut fields = handle.state.lock();
            fields.cycle = snapshot_cycle;
            fields.snapshot_cycle = None;
        }
        info!(session_id = %handle.session_id, cycle = snapshot_cycle, "rollback committed");
        Ok(())
    }

    async fn do_recreate(&self, handle: &SessionHandle) -> MmResult<()> {
        if let Some(address) = handle.current_address() {
            let _ = self.machine.shutdown(&address).await;
        }
        {
            let mut fields = handle.state.lock();
            fields.address = None;
            fields.cycle = 0;
            fields.snapshot_cycle = None;
            fields.updated_at_ms = self.now_ms();
        }
        self.launcher
            .spawn(&handle.session_id, &self.checkin_addr)
            .await
            .map_err(|e| MmError::Other(format!("failed to spawn replacement worker: {e}")))?;
        let new_address = self.await_checkin_or_cleanup(handle).await?;
        handle.record_checkin(new_address.clone(), self.now_ms());
        self.machine
            .create_machine(&new_address, &handle.creation_machine_req)
            .await
            .map_err(|e| self.wrap(handle, e))?;
        info!(session_id = %handle.session_id, "recreate committed");
        Ok(())
    }

    async fn advance_forward(&self, handle: &SessionHandle, target: u64) -> MmResult<RunSummary> {
        let address = self.require_address(handle)?;
        let summary = self.machine.run(&address, target).await.map_err(|e| self.wrap(handle, e))?;
        {
            let mut fields = handle.state.lock();
            fields.cycle = target;
            fields.updated_at_ms = self.now_ms();
        }
        Ok(summary)
    }

    /// `runMachineToDesiredCycle` (§4.1): decide the restore action, then
    /// unconditionally finish with "advance forward to target" unless the
    /// decision was a true no-op.
    async fn seek(&self, handle: &SessionHandle, target: u64) -> MmResult<RunSummary> {
        let (cycle, snapshot_cycle) = {
            let fields = handle.state.lock();
            (fields.cycle, fields.snapshot_cycle)
        };
        let decision = cycle_seek::decide(cycle, target, snapshot_cycle);
        info!(
            session_id = %handle.session_id,
            cycle, target, ?decision,
            "cycle-seek decision"
        );
        match decision {
            SeekDecision::NoOp => Ok(RunSummary(serde_json::Value::Null)),
            SeekDecision::AdvanceOnly => self.advance_forward(handle, target).await,
            SeekDecision::Rollback => {
                self.do_rollback(handle).await?;
                self.advance_forward(handle, target).await
            }
            SeekDecision::Recreate => {
                self.do_recreate(handle).await?;
                self.advance_forward(handle, target).await
            }
        }
    }
}

#[async_trait]
impl<C: Clock> SessionRegistry for ProductionRegistry<C> {
    async fn new_session(
        &self,
        session_id: SessionId,
        machine_req: MachineRequest,
        force: bool,
    ) -> MmResult<MachineHash> {
        let handle = self.insert_session(session_id.clone(), machine_req.clone(), force).await?;
        let _guard = handle.session_lock.lock().await;
        info!(session_id = %session_id, "spawning worker for new session");
        self.launcher
            .spawn(&session_id, &self.checkin_addr)
            .await
            .map_err(|e| MmError::Other(format!("failed to spawn worker: {e}")))?;
        let address = self.await_checkin_or_cleanup(&handle).await?;
        handle.record_checkin(address.clone(), self.now_ms());
        self.machine
            .create_machine(&address, &machine_req)
            .await
            .map_err(|e| self.wrap(&handle, e))?;
        let hash =
            self.machine.get_root_hash(&address).await.map_err(|e| self.wrap(&handle, e))?;
        self.do_snapshot(&handle).await?;
        info!(session_id = %session_id, root_hash = %hash, "session created");
        Ok(hash)
    }

    async fn end_session(&self, session_id: &SessionId) -> MmResult<()> {
        let handle = self.get_handle(session_id)?;
        let _guard = handle.session_lock.lock().await;
        let address = self.require_address(&handle)?;
        let shutdown_result = self.machine.shutdown(&address).await;
        self.sessions.lock().remove(session_id);
        if let Err(e) = shutdown_result {
            warn!(session_id = %session_id, error = %e, "worker shutdown RPC failed, hard-killing");
            self.launcher.kill_all(session_id).await;
        }
        info!(session_id = %session_id, "session ended");
        Ok(())
    }

    async fn run_session(
        &self,
        session_id: &SessionId,
        final_cycles: &[u64],
    ) -> MmResult<Vec<CycleOutcome>> {
        if final_cycles.is_empty() {
            return Err(MmError::Cycle {
                session: session_id.clone(),
                reason: "cycle list must not be empty".into(),
            });
        }
        if !final_cycles.windows(2).all(|w| w[0] < w[1]) {
            return Err(MmError::Cycle {
                session: session_id.clone(),
                reason: "cycle list must be strictly ascending".into(),
            });
        }

        let handle = self.get_handle(session_id)?;
        let _guard = handle.session_lock.lock().await;
        let mut results = Vec::with_capacity(final_cycles.len());
        for (i, &target) in final_cycles.iter().enumerate() {
            let summary = self.seek(&handle, target).await?;
            if i == 0 {
                self.do_snapshot(&handle).await?;
            }
            let address = self.require_address(&handle)?;
            let root_hash =
                self.machine.get_root_hash(&address).await.map_err(|e| self.wrap(&handle, e))?;
            results.push(CycleOutcome { cycle: target, summary, root_hash });
        }
        Ok(results)
    }

    async fn step_session(
        &self,
        session_id: &SessionId,
        initial_cycle: u64,
    ) -> MmResult<AccessLog> {
        let handle = self.get_handle(session_id)?;
        let _guard = handle.session_lock.lock().await;
        self.seek(&handle, initial_cycle).await?;
        let address = self.require_address(&handle)?;
        let log =
            self.machine.step(&address, initial_cycle).await.map_err(|e| self.wrap(&handle, e))?;
        {
            let mut fields = handle.state.lock();
            fields.cycle = initial_cycle + 1;
            fields.updated_at_ms = self.now_ms();
        }
        Ok(log)
    }

    async fn read_memory(
        &self,
        session_id: &SessionId,
        cycle: u64,
        range: MemoryRange,
    ) -> MmResult<Vec<u8>> {
        let handle = self.get_handle(session_id)?;
        let _guard = handle.session_lock.lock().await;
        self.seek(&handle, cycle).await?;
        let address = self.require_address(&handle)?;
        self.machine.read_memory(&address, range).await.map_err(|e| self.wrap(&handle, e))
    }

    async fn write_memory(
        &self,
        session_id: &SessionId,
        cycle: u64,
        write: MemoryWrite,
    ) -> MmResult<()> {
        let handle = self.get_handle(session_id)?;
        let _guard = handle.session_lock.lock().await;
        self.seek(&handle, cycle).await?;
        let address = self.require_address(&handle)?;
        self.machine.write_memory(&address, write).await.map_err(|e| self.wrap(&handle, e))
    }

    async fn get_proof(
        &self,
        session_id: &SessionId,
        cycle: u64,
        target: ProofTarget,
    ) -> MmResult<MerkleProof> {
        let handle = self.get_handle(session_id)?;
        let _guard = handle.session_lock.lock().await;
        self.seek(&handle, cycle).await?;
        let address = self.require_address(&handle)?;
        self.machine.get_proof(&address, target).await.map_err(|e| self.wrap(&handle, e))
    }

    async fn store_session(&self, session_id: &SessionId, dest_path: &str) -> MmResult<()> {
        let handle = self.get_handle(session_id)?;
        let _guard = handle.session_lock.lock().await;
        let address = self.require_address(&handle)?;
        self.machine.store(&address, dest_path).await.map_err(|e| self.wrap(&handle, e))
    }

    async fn checkin(&self, session_id: SessionId, address: WorkerAddress) -> MmResult<()> {
        let handle = self.get_handle(&session_id)?;
        handle.record_checkin(address, self.now_ms());
        Ok(())
    }

    fn status(&self, session_id: &SessionId) -> MmResult<SessionStatus> {
        self.get_handle(session_id).map(|h| h.status())
    }

    fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    async fn shutdown_all(&self) {
        let handles: Vec<Arc<SessionHandle>> = self.sessions.lock().values().cloned().collect();
        let start = std::time::Instant::now();
        info!(session_count = handles.len(), "draining sessions");
        for handle in handles {
            let _guard = handle.session_lock.lock().await;
            if let Some(address) = handle.current_address() {
                if let Err(e) = self.machine.shutdown(&address).await {
                    warn!(session_id = %handle.session_id, error = %e, "worker shutdown failed during drain");
                }
            }
        }
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "drain complete");
    }
}

#[cfg(test)]
#[path = "production_tests.rs"]
mod tests;
