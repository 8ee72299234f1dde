// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mm_core::MachineRequest;
use tokio::net::TcpListener;

/// Accepts exactly one connection, reads one frame, decodes it as a
/// `WorkerRequest`, and writes back the given canned `WorkerResponse`.
async fn serve_one(listener: TcpListener, response: WorkerResponse) {
    let (mut stream, _) = listener.accept().await.expect("accept");
    let bytes = read_message(&mut stream).await.expect("read request");
    let _: WorkerRequest = decode(&bytes).expect("decode request");
    let payload = encode(&response).expect("encode response");
    write_message(&mut stream, &payload).await.expect("write response");
}

#[tokio::test]
async fn get_root_hash_round_trips_over_real_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = WorkerAddress::new(listener.local_addr().expect("local_addr").to_string());
    let expected = MachineHash::from_hex("abc123");
    let server = tokio::spawn(serve_one(listener, WorkerResponse::Hash { root_hash: expected.clone() }));

    let client = RpcMachineClient::new();
    let hash = client.get_root_hash(&addr).await.expect("rpc call");

    assert_eq!(hash, expected);
    server.await.expect("server task");
}

#[tokio::test]
async fn create_machine_surfaces_worker_rejection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = WorkerAddress::new(listener.local_addr().expect("local_addr").to_string());
    let server = tokio::spawn(serve_one(
        listener,
        WorkerResponse::Error { message: "bad ram_length".into() },
    ));

    let client = RpcMachineClient::new();
    let err = client
        .create_machine(&addr, &MachineRequest::fixture())
        .await
        .expect_err("worker rejected");

    assert!(matches!(err, MachineError::Rejected { reason, .. } if reason == "bad ram_length"));
    server.await.expect("server task");
}

#[tokio::test]
async fn unreachable_address_is_reported_as_unreachable() {
    let addr = WorkerAddress::new("127.0.0.1:1");
    let client = RpcMachineClient::new();
    let err = client.get_root_hash(&addr).await.expect_err("connect refused");
    assert!(matches!(err, MachineError::Unreachable { .. }));
}
