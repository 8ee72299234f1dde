// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use mm_core::{FakeClock, MachineRequest, SessionId};
use mm_machine::{FakeMachineClient, FakeWorkerLauncher, MachineClient, WorkerLauncher};

use crate::test_support::{DeferredCheckinSink, SelfCheckinMachineClient};

use super::*;

fn defective() -> Arc<DefectiveRegistry<ProductionRegistry<FakeClock>>> {
    let sink: Arc<DeferredCheckinSink<DefectiveRegistry<ProductionRegistry<FakeClock>>>> =
        Arc::new(DeferredCheckinSink::new());
    let machine: Arc<dyn MachineClient> =
        Arc::new(SelfCheckinMachineClient::new(Arc::new(FakeMachineClient::new()), sink.clone()));
    let launcher: Arc<dyn WorkerLauncher> = Arc::new(FakeWorkerLauncher::new(sink.clone()));
    let inner = ProductionRegistry::new(machine, launcher, "test://coordinator", FakeClock::new());
    let registry = Arc::new(DefectiveRegistry::new(inner));
    sink.bind(Arc::clone(&registry));
    registry
}

fn sid(s: &str) -> SessionId {
    SessionId::from(s.to_string())
}

#[tokio::test]
async fn new_session_returns_corrupted_hash() {
    let registry = defective();
    let id = sid("s1");
    let hash = registry.new_session(id, MachineRequest::fixture(), false).await.expect("new_session");
    // The fake's hash is never a palindrome for a fresh cycle-0/len-0 state
    // ("cycle...0000len...0000" reversed is not equal to itself).
    let expected_forward: String = hash.as_str().chars().rev().collect();
    assert_ne!(hash.as_str(), expected_forward.as_str());
}

#[tokio::test]
async fn run_session_always_fails_with_checkin_error() {
    let registry = defective();
    let id = sid("s2");
    registry.new_session(id.clone(), MachineRequest::fixture(), false).await.expect("new_session");

    let result = registry.run_session(&id, &[10]).await;
    assert!(matches!(result, Err(MmError::Checkin(_))));
}

#[tokio::test]
async fn other_operations_pass_through_unchanged() {
    let registry = defective();
    let id = sid("s3");
    registry.new_session(id.clone(), MachineRequest::fixture(), false).await.expect("new_session");

    let status = registry.status(&id).expect("status");
    assert_eq!(status.cycle, 0);

    registry.end_session(&id).await.expect("end_session");
    assert!(registry.status(&id).is_err());
}
