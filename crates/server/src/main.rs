// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! brd: the batchrun job server.

use br_server::{env, router, AppState, MemoryJobStore, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brd=info,br_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state_dir = env::state_dir()?;
    std::fs::create_dir_all(&state_dir)?;
    let config = ServerConfig::new(state_dir, env::pipeline_bin());
    tracing::info!(
        state_dir = %config.state_dir.display(),
        pipeline = %config.pipeline_bin.display(),
        "starting job server"
    );

    let state = AppState::new(Arc::new(MemoryJobStore::new()), config);
    let app = router(state);

    let addr = env::bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown requested");
}
