// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MachineClient`: the opaque RPC stub to one worker.
//!
//! The registry never holds more than a `WorkerAddress` and a
//! `MachineRequest` when calling through this capability — never the session
//! itself — so the worker-facing boundary can't grow a dependency on
//! registry internals.

use async_trait::async_trait;
use mm_core::{
    AccessLog, MachineHash, MachineRequest, MemoryRange, MemoryWrite, MerkleProof, ProofTarget,
    RunSummary, WorkerAddress,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MachineError {
    #[error("worker at {address} is unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("worker at {address} rejected the request: {reason}")]
    Rejected { address: String, reason: String },
}

/// One live worker process, addressed by its check-in endpoint.
#[async_trait]
pub trait MachineClient: Send + Sync + 'static {
    async fn create_machine(
        &self,
        address: &WorkerAddress,
        req: &MachineRequest,
    ) -> Result<(), MachineError>;

    async fn get_root_hash(&self, address: &WorkerAddress) -> Result<MachineHash, MachineError>;

    async fn run(
        &self,
        address: &WorkerAddress,
        final_cycle: u64,
    ) -> Result<RunSummary, MachineError>;

    async fn step(&self, address: &WorkerAddress, cycle: u64) -> Result<AccessLog, MachineError>;

    async fn read_memory(
        &self,
        address: &WorkerAddress,
        range: MemoryRange,
    ) -> Result<Vec<u8>, MachineError>;

    async fn write_memory(
        &self,
        address: &WorkerAddress,
        write: MemoryWrite,
    ) -> Result<(), MachineError>;

    async fn get_proof(
        &self,
        address: &WorkerAddress,
        target: ProofTarget,
    ) -> Result<MerkleProof, MachineError>;

    async fn store(&self, address: &WorkerAddress, dest_path: &str) -> Result<(), MachineError>;

    /// Ask the worker to persist a snapshot image at its current cycle.
    async fn snapshot(&self, address: &WorkerAddress) -> Result<(), MachineError>;

    /// Ask the worker to restore the most recent snapshot.
    async fn rollback(&self, address: &WorkerAddress) -> Result<(), MachineError>;

    /// Shut the worker down cleanly. Idempotent from the registry's view —
    /// failures are logged and swallowed by callers during drain.
    async fn shutdown(&self, address: &WorkerAddress) -> Result<(), MachineError>;
}
