// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire-framed connection server (§10.1): accepts TCP connections,
//! reads one framed `Request` per round trip, routes it either straight
//! into `SessionRegistry::checkin` (the low-level check-in service, §4.3)
//! or through the `JobDispatcher` (every other, higher-level call), and
//! writes back one framed `Response`.

use std::sync::Arc;

use mm_core::{MmError, MmResult};
use mm_wire::{ErrorKind, ProtocolError, Request, Response};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::JobDispatcher;
use crate::registry::SessionRegistry;

/// Shared state behind every accepted connection: the registry every
/// request ultimately drives, and the per-session job table that
/// deduplicates retries (§4.2).
pub struct Server<R: SessionRegistry + ?Sized> {
    registry: Arc<R>,
    dispatcher: JobDispatcher<Request, MmResult<Response>>,
}

impl<R: SessionRegistry + ?Sized> Server<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry, dispatcher: JobDispatcher::new() }
    }

    /// Accept connections until `shutdown` is cancelled. Each connection is
    /// handled in its own task so one slow or stuck client never blocks
    /// another (§5: no cross-session ordering guarantee).
    pub async fn run(self: Arc<Self>, listener: TcpListener, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let server = Arc::clone(&self);
                            let conn_shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, conn_shutdown).await {
                                    log_connection_error(peer.to_string(), e);
                                }
                            });
                        }
                        Err(e) => error!(error = %e, "accept failed"),
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("listener stopping, no new connections accepted");
                    return;
                }
            }
        }
    }

    /// Read-dispatch-write, looping until the peer disconnects or shutdown
    /// is signaled. A malformed frame terminates this connection only.
    async fn handle_connection(
        &self,
        mut stream: TcpStream,
        shutdown: CancellationToken,
    ) -> Result<(), ProtocolError> {
        loop {
            let request = tokio::select! {
                r = mm_wire::read_request(&mut stream) => r?,
                _ = shutdown.cancelled() => return Ok(()),
            };
            let response = self.dispatch(request).await;
            mm_wire::write_response(&mut stream, &response).await?;
        }
    }

    async fn dispatch(&self, request: Request) -> Response {
        if let Request::CommunicateAddress { session_id, address } = request {
            let result = self.registry.checkin(session_id, address).await.map(|()| Response::Void);
            return to_response(result);
        }

        if self.registry.is_shutting_down() {
            return to_response(Err(MmError::ShuttingDown));
        }

        let session_id = request.session_id().clone();
        let registry = Arc::clone(&self.registry);
        let job_request = request.clone();
        let outcome = self
            .dispatcher
            .try_job(&session_id, &request, move || run_request(registry, job_request))
            .await;

        match outcome {
            Ok(inner) => to_response(inner),
            Err(e) => to_response(Err(e)),
        }
    }
}

/// Drive one dispatched request (everything but `CommunicateAddress`)
/// through the registry, translating its typed result into a `Response`.
async fn run_request<R: SessionRegistry + ?Sized>(
    registry: Arc<R>,
    request: Request,
) -> MmResult<Response> {
    match request {
        Request::NewSession { session_id, machine_req, force } => {
            let root_hash = registry.new_session(session_id, machine_req, force).await?;
            Ok(Response::Hash { root_hash })
        }
        Request::EndSession { session_id } => {
            registry.end_session(&session_id).await?;
            Ok(Response::Void)
        }
        Request::SessionRun { session_id, final_cycles } => {
            let outcomes = registry.run_session(&session_id, &final_cycles).await?;
            let results = outcomes
                .into_iter()
                .map(|o| mm_core::CycleResult { cycle: o.cycle, summary: o.summary, root_hash: o.root_hash })
                .collect();
            Ok(Response::RunResult { results })
        }
        Request::SessionStep { session_id, initial_cycle } => {
            let log = registry.step_session(&session_id, initial_cycle).await?;
            Ok(Response::StepResult { log })
        }
        Request::SessionReadMemory { session_id, cycle, range } => {
            let data = registry.read_memory(&session_id, cycle, range).await?;
            Ok(Response::ReadMemoryResult { data })
        }
        Request::SessionWriteMemory { session_id, cycle, write } => {
            registry.write_memory(&session_id, cycle, write).await?;
            Ok(Response::Void)
        }
        Request::SessionGetProof { session_id, cycle, target } => {
            let proof = registry.get_proof(&session_id, cycle, target).await?;
            Ok(Response::Proof { proof })
        }
        Request::SessionStore { session_id, dest_path } => {
            registry.store_session(&session_id, &dest_path).await?;
            Ok(Response::Void)
        }
        Request::CommunicateAddress { .. } => {
            unreachable!("check-ins are handled before a job is ever dispatched")
        }
    }
}

/// Map a registry-level result onto the wire `Response` enum (§7): success
/// carries its payload, `NotReady` gets its own variant so clients can
/// distinguish "still running" from a terminal error, and everything else
/// carries the §7 error-kind tag.
fn to_response(result: MmResult<Response>) -> Response {
    match result {
        Ok(response) => response,
        Err(MmError::NotReady(message)) => Response::NotReady { message },
        Err(e) => {
            let kind = ErrorKind::from(&e);
            warn!(kind = ?kind, error = %e, "request failed");
            Response::Error { kind, message: e.to_string() }
        }
    }
}

fn log_connection_error(peer: String, e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!(peer = %peer, "client disconnected"),
        _ => warn!(peer = %peer, error = %e, "connection error"),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
