// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production `MachineClient`: one short-lived TCP connection per call,
//! framed with the same length-prefixed JSON encoding the coordinator's own
//! client-facing wire protocol uses (§10.1). The worker's exact request
//! vocabulary is its own business — this is just a vocabulary big enough to
//! drive every `MachineClient` operation, not a re-export of the
//! client-facing `Request`/`Response` types those serve a different service.

use async_trait::async_trait;
use mm_core::{
    AccessLog, MachineHash, MachineRequest, MemoryRange, MemoryWrite, MerkleProof, ProofTarget,
    RunSummary, WorkerAddress,
};
use mm_wire::{decode, encode, read_message, write_message};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;

use crate::client::{MachineClient, MachineError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op")]
enum WorkerRequest {
    CreateMachine { req: MachineRequest },
    GetRootHash,
    Run { final_cycle: u64 },
    Step { cycle: u64 },
    ReadMemory { range: MemoryRange },
    WriteMemory { write: MemoryWrite },
    GetProof { target: ProofTarget },
    Store { dest_path: String },
    Snapshot,
    Rollback,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result")]
enum WorkerResponse {
    Void,
    Hash { root_hash: MachineHash },
    RunResult { summary: RunSummary },
    StepResult { log: AccessLog },
    ReadMemoryResult { data: Vec<u8> },
    Proof { proof: MerkleProof },
    Error { message: String },
}

/// Connects fresh for every call. Workers are addressed one RPC at a time
/// and the coordinator never needs to multiplex several in flight against
/// the same worker (`session_lock` already serializes them), so there is
/// nothing a persistent connection would buy here.
#[derive(Default)]
pub struct RpcMachineClient;

impl RpcMachineClient {
    pub fn new() -> Self {
        Self
    }

    async fn call(
        &self,
        address: &WorkerAddress,
        request: WorkerRequest,
    ) -> Result<WorkerResponse, MachineError> {
        let unreachable = |reason: String| MachineError::Unreachable {
            address: address.to_string(),
            reason,
        };
        let mut stream =
            TcpStream::connect(address.as_str()).await.map_err(|e| unreachable(e.to_string()))?;
        let payload = encode(&request).map_err(|e| unreachable(e.to_string()))?;
        write_message(&mut stream, &payload).await.map_err(|e| unreachable(e.to_string()))?;
        let bytes = read_message(&mut stream).await.map_err(|e| unreachable(e.to_string()))?;
        decode(&bytes).map_err(|e| unreachable(e.to_string()))
    }

    fn rejected(address: &WorkerAddress, reason: impl Into<String>) -> MachineError {
        MachineError::Rejected { address: address.to_string(), reason: reason.into() }
    }
}

#[async_trait]
impl MachineClient for RpcMachineClient {
    async fn create_machine(
        &self,
        address: &WorkerAddress,
        req: &MachineRequest,
    ) -> Result<(), MachineError> {
        match self.call(address, WorkerRequest::CreateMachine { req: req.clone() }).await? {
            WorkerResponse::Void => Ok(()),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to CreateMachine")),
        }
    }

    async fn get_root_hash(&self, address: &WorkerAddress) -> Result<MachineHash, MachineError> {
        match self.call(address, WorkerRequest::GetRootHash).await? {
            WorkerResponse::Hash { root_hash } => Ok(root_hash),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to GetRootHash")),
        }
    }

    async fn run(
        &self,
        address: &WorkerAddress,
        final_cycle: u64,
    ) -> Result<RunSummary, MachineError> {
        match self.call(address, WorkerRequest::Run { final_cycle }).await? {
            WorkerResponse::RunResult { summary } => Ok(summary),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to Run")),
        }
    }

    async fn step(&self, address: &WorkerAddress, cycle: u64) -> Result<AccessLog, MachineError> {
        match self.call(address, WorkerRequest::Step { cycle }).await? {
            WorkerResponse::StepResult { log } => Ok(log),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to Step")),
        }
    }

    async fn read_memory(
        &self,
        address: &WorkerAddress,
        range: MemoryRange,
    ) -> Result<Vec<u8>, MachineError> {
        match self.call(address, WorkerRequest::ReadMemory { range }).await? {
            WorkerResponse::ReadMemoryResult { data } => Ok(data),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to ReadMemory")),
        }
    }

    async fn write_memory(
        &self,
        address: &WorkerAddress,
        write: MemoryWrite,
    ) -> Result<(), MachineError> {
        match self.call(address, WorkerRequest::WriteMemory { write }).await? {
            WorkerResponse::Void => Ok(()),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to WriteMemory")),
        }
    }

    async fn get_proof(
        &self,
        address: &WorkerAddress,
        target: ProofTarget,
    ) -> Result<MerkleProof, MachineError> {
        match self.call(address, WorkerRequest::GetProof { target }).await? {
            WorkerResponse::Proof { proof } => Ok(proof),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to GetProof")),
        }
    }

    async fn store(&self, address: &WorkerAddress, dest_path: &str) -> Result<(), MachineError> {
        match self.call(address, WorkerRequest::Store { dest_path: dest_path.to_string() }).await?
        {
            WorkerResponse::Void => Ok(()),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to Store")),
        }
    }

    async fn snapshot(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        match self.call(address, WorkerRequest::Snapshot).await? {
            WorkerResponse::Void => Ok(()),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to Snapshot")),
        }
    }

    async fn rollback(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        match self.call(address, WorkerRequest::Rollback).await? {
            WorkerResponse::Void => Ok(()),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to Rollback")),
        }
    }

    async fn shutdown(&self, address: &WorkerAddress) -> Result<(), MachineError> {
        match self.call(address, WorkerRequest::Shutdown).await? {
            WorkerResponse::Void => Ok(()),
            WorkerResponse::Error { message } => Err(Self::rejected(address, message)),
            _ => Err(Self::rejected(address, "unexpected response to Shutdown")),
        }
    }
}

#[cfg(test)]
#[path = "rpc_client_tests.rs"]
mod tests;
