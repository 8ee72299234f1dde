// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory test doubles for `MachineClient` and `WorkerLauncher`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mm_core::{
    AccessLog, MachineHash, MachineRequest, MemoryRange, MemoryWrite, MerkleProof, ProofTarget,
    RunSummary, SessionId, WorkerAddress,
};
use parking_lot::Mutex;

use crate::checkin_sink::CheckinSink;
use crate::client::{MachineClient, MachineError};
use crate::launcher::{LaunchError, WorkerLauncher};

#[derive(Default, Clone)]
struct AddrState {
    cycle: u64,
    memory: Vec<u8>,
    snapshot: Option<(u64, Vec<u8>)>,
}

impl AddrState {
    fn hash(&self) -> MachineHash {
        MachineHash::from_hex(format!("cycle{:016x}len{:08x}", self.cycle, self.memory.len()))
    }
}

/// A `MachineClient` that simulates a deterministic emulator in memory.
///
/// Per-address state auto-initializes to cycle 0 on first touch, so calls
/// made against a freshly checked-in address (which never saw
/// `create_machine` again after a rollback, only after a recreate) don't
/// error.
#[derive(Default)]
pub struct FakeMachineClient {
    state: Mutex<HashMap<WorkerAddress, AddrState>>,
    calls: Mutex<Vec<String>>,
}

impl FakeMachineClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl MachineClient for FakeMachineClient {
    async fn create_machine(
        &self,
        address: &WorkerAddress,
        _req: &MachineRequest,
    ) -> Result<(), MachineError> {
        self.record(format!("create_machine({address})"));
        self.state.lock().insert(address.clone(), AddrState::default());
        Ok(())
    }

    async fn get_root_hash(&self, address: &WorkerAddress) -> Result<MachineHash, MachineError> {
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        Ok(entry.hash())
    }

    async fn run(
        &self,
        address: &WorkerAddress,
        final_cycle: u64,
    ) -> Result<RunSummary, MachineError> {
        self.record(format!("run({address}, {final_cycle})"));
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        entry.cycle = final_cycle;
        Ok(RunSummary(serde_json::json!({ "final_cycle": final_cycle })))
    }

    async fn step(&self, address: &WorkerAddress, cycle: u64) -> Result<AccessLog, MachineError> {
        self.record(format!("step({address}, {cycle})"));
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        entry.cycle = cycle + 1;
        Ok(AccessLog(serde_json::json!({ "cycle": cycle, "accesses": [] })))
    }

    async fn read_memory(
        &self,
        address: &WorkerAddress,
        range: MemoryRange,
    ) -> Result<Vec<u8>, MachineError> {
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        let start = range.address as usize;
        let end = start + range.length as usize;
        if entry.memory.len() < end {
            entry.memory.resize(end, 0);
        }
        Ok(entry.memory[start..end].to_vec())
    }

    async fn write_memory(
        &self,
        address: &WorkerAddress,
        write: MemoryWrite,
    ) -> Result<(), MachineError> {
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        let start = write.address as usize;
        let end = start + write.data.len();
        if entry.memory.len() < end {
            entry.memory.resize(end, 0);
        }
        entry.memory[start..end].copy_from_slice(&write.data);
        Ok(())
    }

    async fn get_proof(
        &self,
        address: &WorkerAddress,
        target: ProofTarget,
    ) -> Result<MerkleProof, MachineError> {
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        Ok(MerkleProof {
            target_address: target.address,
            log2_size: target.log2_size,
            sibling_hashes: Vec::new(),
            root_hash: entry.hash(),
        })
    }

    async fn store(&self, address: &WorkerAddress, dest_path: &str) -> Result<(), MachineError> {
        self.record(format!("store({address}, {dest_path})"));
        Ok(())
    }

    async fn snapshot(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        self.record(format!("snapshot({address})"));
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        entry.snapshot = Some((entry.cycle, entry.memory.clone()));
        Ok(())
    }

    async fn rollback(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        self.record(format!("rollback({address})"));
        let mut state = self.state.lock();
        let entry = state.entry(address.clone()).or_default();
        if let Some((cycle, memory)) = entry.snapshot.clone() {
            entry.cycle = cycle;
            entry.memory = memory;
        }
        Ok(())
    }

    async fn shutdown(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        self.record(format!("shutdown({address})"));
        self.state.lock().remove(address);
        Ok(())
    }
}

/// A `WorkerLauncher` that simulates spawning by immediately (post-yield)
/// delivering a check-in to the configured sink, unless the session id is
/// on the `never_checkin` deny-list (used to exercise the timeout path).
pub struct FakeWorkerLauncher {
    sink: Arc<dyn CheckinSink>,
    generation: Mutex<HashMap<String, u64>>,
    never_checkin: Mutex<std::collections::HashSet<String>>,
    kill_calls: Mutex<Vec<String>>,
}

impl FakeWorkerLauncher {
    pub fn new(sink: Arc<dyn CheckinSink>) -> Self {
        Self {
            sink,
            generation: Mutex::new(HashMap::new()),
            never_checkin: Mutex::new(std::collections::HashSet::new()),
            kill_calls: Mutex::new(Vec::new()),
        }
    }

    /// Mark a session id so that `spawn` never delivers a check-in for it,
    /// simulating a worker that fails to come up.
    pub fn suppress_checkin_for(&self, session_id: &SessionId) {
        self.never_checkin.lock().insert(session_id.to_string());
    }

    pub fn kill_calls(&self) -> Vec<String> {
        self.kill_calls.lock().clone()
    }
}

#[async_trait]
impl WorkerLauncher for FakeWorkerLauncher {
    async fn spawn(&self, session_id: &SessionId, _checkin_addr: &str) -> Result<(), LaunchError> {
        if self.never_checkin.lock().contains(session_id.as_str()) {
            return Ok(());
        }

        let generation = {
            let mut gens = self.generation.lock();
            let gen = gens.entry(session_id.to_string()).or_insert(0);
            *gen += 1;
            *gen
        };
        let address = WorkerAddress::new(format!("fake://{session_id}/{generation}"));
        let sink = Arc::clone(&self.sink);
        let session_id = session_id.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            sink.checkin(session_id, address).await;
        });
        Ok(())
    }

    async fn kill_all(&self, session_id: &SessionId) {
        self.kill_calls.lock().push(session_id.to_string());
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
