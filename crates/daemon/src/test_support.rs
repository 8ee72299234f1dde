// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test wiring: connects `mm_machine`'s fakes to a `SessionRegistry`
//! the way the real wire server connects a worker's `CommunicateAddress`
//! call to `SessionRegistry::checkin`.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use mm_core::{
    AccessLog, MachineHash, MachineRequest, MemoryRange, MemoryWrite, MerkleProof, ProofTarget,
    RunSummary, SessionId, WorkerAddress,
};
use mm_machine::{CheckinSink, FakeMachineClient, MachineClient, MachineError};

use crate::registry::SessionRegistry;

/// Forwards a `FakeWorkerLauncher`'s simulated check-ins straight into a
/// registry, standing in for the real wire path (`CommunicateAddress` ->
/// `CheckinService` -> `SessionRegistry::checkin`).
///
/// The registry itself is constructed from a `MachineClient`/`WorkerLauncher`
/// pair that must already hold this sink, so the registry's own `Arc` can't
/// exist yet when the sink is built. `bind` plugs that `Arc` in right after
/// construction, before any test operation can trigger a check-in.
pub struct DeferredCheckinSink<R: SessionRegistry> {
    registry: OnceLock<Arc<R>>,
}

impl<R: SessionRegistry> DeferredCheckinSink<R> {
    pub fn new() -> Self {
        Self { registry: OnceLock::new() }
    }

    pub fn bind(&self, registry: Arc<R>) {
        let _ = self.registry.set(registry);
    }
}

impl<R: SessionRegistry> Default for DeferredCheckinSink<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: SessionRegistry> CheckinSink for DeferredCheckinSink<R> {
    async fn checkin(&self, session_id: SessionId, address: WorkerAddress) {
        if let Some(registry) = self.registry.get() {
            let _ = registry.checkin(session_id, address).await;
        }
    }
}

/// Wraps `FakeMachineClient` so that `snapshot`/`rollback` simulate the
/// worker-side half of a Cartesi-style fork: the old process exits and a
/// replacement checks in, just like a real worker would over the wire.
///
/// `FakeMachineClient` itself stays address-only (it has no notion of
/// sessions), so this lives in the daemon crate, the one place that knows
/// both a `CheckinSink` and the `fake://{session_id}/{generation}` address
/// shape `FakeWorkerLauncher` hands out. The replacement checks in at the
/// *same* address — nothing downstream distinguishes a restarted worker
/// that happens to reuse its endpoint from one that doesn't.
pub struct SelfCheckinMachineClient {
    inner: Arc<FakeMachineClient>,
    sink: Arc<dyn CheckinSink>,
}

impl SelfCheckinMachineClient {
    pub fn new(inner: Arc<FakeMachineClient>, sink: Arc<dyn CheckinSink>) -> Self {
        Self { inner, sink }
    }

    fn session_id_of(address: &WorkerAddress) -> SessionId {
        let rest = address.as_str().strip_prefix("fake://").unwrap_or(address.as_str());
        let session = rest.rsplit_once('/').map_or(rest, |(session, _)| session);
        SessionId::from(session.to_string())
    }

    fn deliver_checkin(&self, address: &WorkerAddress) {
        let session_id = Self::session_id_of(address);
        let address = address.clone();
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            sink.checkin(session_id, address).await;
        });
    }
}

#[async_trait]
impl MachineClient for SelfCheckinMachineClient {
    async fn create_machine(
        &self,
        address: &WorkerAddress,
        req: &MachineRequest,
    ) -> Result<(), MachineError> {
        self.inner.create_machine(address, req).await
    }

    async fn get_root_hash(&self, address: &WorkerAddress) -> Result<MachineHash, MachineError> {
        self.inner.get_root_hash(address).await
    }

    async fn run(
        &self,
        address: &WorkerAddress,
        final_cycle: u64,
    ) -> Result<RunSummary, MachineError> {
        self.inner.run(address, final_cycle).await
    }

    async fn step(&self, address: &WorkerAddress, cycle: u64) -> Result<AccessLog, MachineError> {
        self.inner.step(address, cycle).await
    }

    async fn read_memory(
        &self,
        address: &WorkerAddress,
        range: MemoryRange,
    ) -> Result<Vec<u8>, MachineError> {
        self.inner.read_memory(address, range).await
    }

    async fn write_memory(
        &self,
        address: &WorkerAddress,
        write: MemoryWrite,
    ) -> Result<(), MachineError> {
        self.inner.write_memory(address, write).await
    }

    async fn get_proof(
        &self,
        address: &WorkerAddress,
        target: ProofTarget,
    ) -> Result<MerkleProof, MachineError> {
        self.inner.get_proof(address, target).await
    }

    async fn store(&self, address: &WorkerAddress, dest_path: &str) -> Result<(), MachineError> {
        self.inner.store(address, dest_path).await
    }

    async fn snapshot(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        self.inner.snapshot(address).await?;
        self.deliver_checkin(address);
        Ok(())
    }

    async fn rollback(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        self.inner.rollback(address).await?;
        self.deliver_checkin(address);
        Ok(())
    }

    async fn shutdown(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        self.inner.shutdown(address).await
    }
}
