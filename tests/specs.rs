// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios driven over the real wire protocol: a `TcpListener`
//! bound to an ephemeral port, `mm_daemon::server::Server` accepting on it,
//! and a plain `TcpStream` client speaking length-prefixed JSON frames, the
//! same way a real client or worker would.

use std::sync::Arc;
use std::time::Duration;

use mm_core::{FakeClock, MachineRequest, MemoryRange, MemoryWrite, ProofTarget, SessionId};
use mm_daemon::registry::{ProductionRegistry, SessionRegistry};
use mm_daemon::server::Server;
use mm_daemon::test_support::{DeferredCheckinSink, SelfCheckinMachineClient};
use mm_machine::{FakeMachineClient, FakeWorkerLauncher, MachineClient, WorkerLauncher};
use mm_wire::{decode, encode, read_message, write_message, Request, Response};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

struct Cluster {
    registry: Arc<ProductionRegistry<FakeClock>>,
    machine: Arc<FakeMachineClient>,
    launcher: Arc<FakeWorkerLauncher>,
    client: TcpStream,
    shutdown: CancellationToken,
    accept_task: tokio::task::JoinHandle<()>,
}

impl Cluster {
    async fn request(&mut self, request: Request) -> Response {
        loop {
            write_message(&mut self.client, &encode(&request).expect("encode")).await.expect("write");
            let bytes = read_message(&mut self.client).await.expect("read");
            match decode::<Response>(&bytes).expect("decode") {
                Response::NotReady { .. } => tokio::task::yield_now().await,
                other => return other,
            }
        }
    }

    async fn shutdown(self) {
        self.shutdown.cancel();
        self.accept_task.await.expect("accept task");
    }
}

async fn cluster() -> Cluster {
    let sink = Arc::new(DeferredCheckinSink::new());
    let machine = Arc::new(FakeMachineClient::new());
    let self_checkin_machine: Arc<dyn MachineClient> =
        Arc::new(SelfCheckinMachineClient::new(Arc::clone(&machine), sink.clone()));
    let launcher = Arc::new(FakeWorkerLauncher::new(sink.clone()));
    let launcher_dyn: Arc<dyn WorkerLauncher> = Arc::clone(&launcher) as Arc<dyn WorkerLauncher>;
    let registry = Arc::new(ProductionRegistry::new(
        self_checkin_machine,
        launcher_dyn,
        "test://coordinator",
        FakeClock::new(),
    ));
    sink.bind(Arc::clone(&registry));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    let server = Arc::new(Server::new(Arc::clone(&registry)));
    let shutdown = CancellationToken::new();
    let accept_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.run(listener, shutdown).await })
    };
    let client = TcpStream::connect(addr).await.expect("connect");

    Cluster { registry, machine, launcher, client, shutdown, accept_task }
}

fn sid(s: &str) -> SessionId {
    SessionId::from(s.to_string())
}

#[tokio::test]
async fn new_session_then_read_hash_at_cycle_zero() {
    let mut c = cluster().await;
    let id = sid("s1");

    let root_hash = match c
        .request(Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false })
        .await
    {
        Response::Hash { root_hash } => root_hash,
        other => panic!("expected Hash, got {other:?}"),
    };

    match c
        .request(Request::SessionGetProof { session_id: id, cycle: 0, target: ProofTarget { address: 0, log2_size: 64 } })
        .await
    {
        Response::Proof { proof } => assert_eq!(proof.root_hash, root_hash),
        other => panic!("expected Proof, got {other:?}"),
    }

    c.shutdown().await;
}

#[tokio::test]
async fn monotone_run_advances_cycle_and_reports_every_target() {
    let mut c = cluster().await;
    let id = sid("s2");
    c.request(Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false })
        .await;

    let results = match c.request(Request::SessionRun { session_id: id.clone(), final_cycles: vec![10, 20, 30] }).await
    {
        Response::RunResult { results } => results,
        other => panic!("expected RunResult, got {other:?}"),
    };
    assert_eq!(results.iter().map(|r| r.cycle).collect::<Vec<_>>(), vec![10, 20, 30]);

    let status = c.registry.status(&id).expect("status");
    assert_eq!(status.cycle, 30);
    assert_eq!(status.snapshot_cycle, Some(10));

    c.shutdown().await;
}

#[tokio::test]
async fn read_at_snapshot_cycle_rolls_back_instead_of_recreating() {
    let mut c = cluster().await;
    let id = sid("s3");
    c.request(Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false })
        .await;
    c.request(Request::SessionRun { session_id: id.clone(), final_cycles: vec![10, 20, 30] }).await;

    let response = c
        .request(Request::SessionReadMemory { session_id: id.clone(), cycle: 15, range: MemoryRange { address: 0, length: 4 } })
        .await;
    assert!(matches!(response, Response::ReadMemoryResult { .. }));
    assert!(c.machine.calls().iter().any(|call| call.starts_with("rollback(")));

    c.shutdown().await;
}

#[tokio::test]
async fn read_below_snapshot_cycle_recreates_the_machine() {
    let mut c = cluster().await;
    let id = sid("s4");
    c.request(Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false })
        .await;
    c.request(Request::SessionRun { session_id: id.clone(), final_cycles: vec![10, 20, 30] }).await;

    let response = c
        .request(Request::SessionReadMemory { session_id: id.clone(), cycle: 5, range: MemoryRange { address: 0, length: 4 } })
        .await;
    assert!(matches!(response, Response::ReadMemoryResult { .. }));
    assert!(c.machine.calls().iter().any(|call| call.starts_with("create_machine(")));

    c.shutdown().await;
}

#[tokio::test]
async fn write_then_read_round_trips_over_the_wire() {
    let mut c = cluster().await;
    let id = sid("s5");
    c.request(Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false })
        .await;

    let response = c
        .request(Request::SessionWriteMemory {
            session_id: id.clone(),
            cycle: 0,
            write: MemoryWrite { address: 8, data: vec![9, 9, 9, 9] },
        })
        .await;
    assert!(matches!(response, Response::Void));

    let response = c
        .request(Request::SessionReadMemory { session_id: id, cycle: 0, range: MemoryRange { address: 8, length: 4 } })
        .await;
    match response {
        Response::ReadMemoryResult { data } => assert_eq!(data, vec![9, 9, 9, 9]),
        other => panic!("expected ReadMemoryResult, got {other:?}"),
    }

    c.shutdown().await;
}

#[tokio::test]
async fn step_at_cycle_zero_then_proof_at_cycle_one_takes_the_post_step_state() {
    let mut c = cluster().await;
    let id = sid("s5b");
    c.request(Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false })
        .await;

    let response = c.request(Request::SessionStep { session_id: id.clone(), initial_cycle: 0 }).await;
    assert!(matches!(response, Response::StepResult { .. }));

    // If the registry's cycle weren't advanced past the step, this proof
    // request at cycle 1 would spuriously roll the worker back to cycle 0
    // instead of reading the real post-step state.
    let response = c
        .request(Request::SessionGetProof { session_id: id.clone(), cycle: 1, target: ProofTarget { address: 0, log2_size: 64 } })
        .await;
    assert!(matches!(response, Response::Proof { .. }));
    assert!(!c.machine.calls().iter().any(|call| call.starts_with("rollback(")));

    c.shutdown().await;
}

#[tokio::test]
async fn unknown_session_id_is_reported_as_a_terminal_error_not_not_ready() {
    let mut c = cluster().await;

    let response = c.request(Request::EndSession { session_id: sid("never-created") }).await;
    match response {
        Response::Error { kind, .. } => assert_eq!(kind, mm_wire::ErrorKind::SessionId),
        other => panic!("expected Error, got {other:?}"),
    }

    c.shutdown().await;
}

#[tokio::test]
async fn repeated_identical_request_is_the_retry_contract_for_a_slow_job() {
    // The very first round trip for any dispatched request always answers
    // `NotReady` while the background job is starting (§4.2); sending the
    // byte-identical request again is how a client is meant to poll for
    // completion rather than treating the first reply as failure.
    let mut c = cluster().await;
    let id = sid("s6");
    let request =
        Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false };

    write_message(&mut c.client, &encode(&request).expect("encode")).await.expect("write");
    let first = decode::<Response>(&read_message(&mut c.client).await.expect("read")).expect("decode");
    assert!(matches!(first, Response::NotReady { .. }));

    let second = c.request(request).await;
    assert!(matches!(second, Response::Hash { .. }));

    c.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn worker_checkin_timeout_surfaces_as_a_checkin_error() {
    let mut c = cluster().await;
    let id = sid("s7");
    c.launcher.suppress_checkin_for(&id);

    let request =
        Request::NewSession { session_id: id.clone(), machine_req: MachineRequest::fixture(), force: false };
    write_message(&mut c.client, &encode(&request).expect("encode")).await.expect("write");
    let first = decode::<Response>(&read_message(&mut c.client).await.expect("read")).expect("decode");
    assert!(matches!(first, Response::NotReady { .. }));

    tokio::time::advance(Duration::from_secs(6)).await;

    write_message(&mut c.client, &encode(&request).expect("encode")).await.expect("write");
    let response = decode::<Response>(&read_message(&mut c.client).await.expect("read")).expect("decode");
    match response {
        Response::Error { kind, .. } => assert_eq!(kind, mm_wire::ErrorKind::Checkin),
        other => panic!("expected Error, got {other:?}"),
    }
    assert_eq!(c.launcher.kill_calls(), vec![id.to_string()]);

    c.shutdown().await;
}
