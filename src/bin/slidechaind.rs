// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The custodian daemon (spec §6): boots the store, the custodian
//! identity, and every background task, then serves the HTTP surface.

use std::sync::Arc;

use clap::Parser;
use slidechain::config::{Cli, Config};
use slidechain::http::handlers::AppState;
use slidechain::mainchain::HttpMainChainClient;
use slidechain::supervisor::Supervisor;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    slidechain::telemetry::init();

    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;

    let supervisor = Supervisor::boot(&config).await?;
    let main_chain: Arc<dyn slidechain::mainchain::MainChainClient> =
        Arc::new(HttpMainChainClient::new(config.horizon.clone(), "custodian"));

    let state = AppState {
        store: supervisor.store.clone(),
        submitter: supervisor.submitter.clone(),
        main_chain: main_chain.clone(),
    };
    let app = slidechain::http::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "listening");

    let serve = tokio::spawn(async move {
        axum::serve(listener, app).await
    });

    tokio::select! {
        result = supervisor.run(config, main_chain) => {
            if let Err(err) = result {
                if !matches!(err, slidechain::Error::Cancelled) {
                    anyhow::bail!("supervisor exited: {err}");
                }
            }
        }
        result = serve => {
            result??;
        }
    }

    Ok(())
}
