// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mm_core::SessionId;

#[tokio::test]
async fn spawn_succeeds_for_an_existing_binary() {
    let launcher = ProcessWorkerLauncher::new("true");
    let result = launcher.spawn(&SessionId::new("s1"), "127.0.0.1:9000").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn spawn_fails_for_a_missing_binary() {
    let launcher = ProcessWorkerLauncher::new("definitely-not-a-real-worker-binary");
    let result = launcher.spawn(&SessionId::new("s1"), "127.0.0.1:9000").await;
    assert!(matches!(result, Err(LaunchError::SpawnFailed { .. })));
}

#[tokio::test]
async fn kill_all_does_not_panic_when_pkill_finds_nothing() {
    let launcher = ProcessWorkerLauncher::new("true");
    launcher.kill_all(&SessionId::new("no-such-session")).await;
}
