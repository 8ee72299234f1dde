// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mmd`: the machine coordination daemon binary.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use mm_core::SystemClock;
use mm_daemon::config::Config;
use mm_daemon::registry::{DefectiveRegistry, ProductionRegistry, SessionRegistry};
use mm_daemon::server::Server;
use mm_daemon::{lifecycle, logging};
use mm_machine::{MachineClient, ProcessWorkerLauncher, RpcMachineClient, WorkerLauncher};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let config = Config::parse();

    let listener = match TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %config.bind_addr(), error = %e, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    info!(address = %config.bind_addr(), defective = config.defective, "listening");

    let machine: Arc<dyn MachineClient> = Arc::new(RpcMachineClient::new());
    let launcher: Arc<dyn WorkerLauncher> = Arc::new(ProcessWorkerLauncher::new(config.worker_bin.clone()));
    let production =
        ProductionRegistry::new(machine, launcher, config.bind_addr(), SystemClock);
    let registry: Arc<dyn SessionRegistry> = if config.defective {
        Arc::new(DefectiveRegistry::new(production))
    } else {
        Arc::new(production)
    };

    let server = Arc::new(Server::new(Arc::clone(&registry)));
    let shutdown = CancellationToken::new();
    let accept_task = {
        let server = Arc::clone(&server);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.run(listener, shutdown).await })
    };

    lifecycle::wait_for_shutdown(&registry).await;
    shutdown.cancel();
    if let Err(e) = accept_task.await {
        error!(error = %e, "listener task panicked");
    }

    ExitCode::SUCCESS
}
