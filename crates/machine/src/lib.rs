// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mm-machine: capabilities for driving and supervising worker processes.

pub mod checkin_sink;
pub mod client;
pub mod launcher;
pub mod rpc_client;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use checkin_sink::CheckinSink;
pub use client::{MachineClient, MachineError};
pub use launcher::{LaunchError, ProcessWorkerLauncher, WorkerLauncher};
pub use rpc_client::RpcMachineClient;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMachineClient, FakeWorkerLauncher};
