// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle / shutdown coordinator (§4.4): on SIGTERM/SIGINT, stop
//! accepting new work and drain every live session's worker.

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::registry::SessionRegistry;

/// Block until SIGTERM or SIGINT arrives, then begin shutdown (subsequent
/// dispatcher entries reject with `ShuttingDown`) and drain the registry.
///
/// Returns once the drain completes. The caller is responsible for stopping
/// the listener and waiting for in-flight handlers to finish (§4.4 step 3);
/// this function only covers step 1 and step 2.
pub async fn wait_for_shutdown<R: SessionRegistry + ?Sized>(registry: &Arc<R>) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, draining"),
        _ = sigint.recv() => info!("received SIGINT, draining"),
    }

    drain(registry).await;
}

/// The post-signal half of shutdown, split out so it is testable without
/// sending an OS signal to the test process.
async fn drain<R: SessionRegistry + ?Sized>(registry: &Arc<R>) {
    registry.begin_shutdown();
    registry.shutdown_all().await;
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
