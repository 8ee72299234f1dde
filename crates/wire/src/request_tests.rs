// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mm_core::MachineRequest;

#[test]
fn session_id_extracts_from_every_variant() {
    let requests = vec![
        Request::NewSession {
            session_id: SessionId::new("s1"),
            machine_req: MachineRequest::fixture(),
            force: false,
        },
        Request::EndSession { session_id: SessionId::new("s1") },
        Request::SessionRun { session_id: SessionId::new("s1"), final_cycles: vec![10] },
        Request::CommunicateAddress {
            session_id: SessionId::new("s1"),
            address: WorkerAddress::new("127.0.0.1:9000"),
        },
    ];
    for request in requests {
        assert_eq!(request.session_id(), &SessionId::new("s1"));
    }
}

#[test]
fn communicate_address_is_not_dispatched() {
    let request = Request::CommunicateAddress {
        session_id: SessionId::new("s1"),
        address: WorkerAddress::new("127.0.0.1:9000"),
    };
    assert!(!request.is_dispatched());
}

#[test]
fn session_run_is_dispatched() {
    let request = Request::SessionRun { session_id: SessionId::new("s1"), final_cycles: vec![1] };
    assert!(request.is_dispatched());
}

#[test]
fn request_round_trips_through_json() {
    let request = Request::SessionReadMemory {
        session_id: SessionId::new("s1"),
        cycle: 10,
        range: mm_core::MemoryRange { address: 0, length: 8 },
    };
    let json = serde_json::to_string(&request).unwrap();
    let parsed: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, request);
}
