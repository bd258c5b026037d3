// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process entry points for the two services.
//!
//! Each binary loads its configuration, builds state and router, then serves
//! plain HTTP until SIGINT or SIGTERM. Shutdown is signalled through a
//! `CancellationToken` so in-flight requests can finish.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::{chat_router, identity_router};
use crate::config::{ChatConfig, IdentityConfig};
use crate::state::{ChatState, IdentityState};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Serve `router` on `addr` until `shutdown` is cancelled.
pub async fn serve(router: Router, addr: SocketAddr, shutdown: CancellationToken) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening (docs at /docs)");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
pub async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

/// Run the identity service.
pub async fn run_identity(config: IdentityConfig) -> Result<(), BoxError> {
    let addr = config.server.socket_addr()?;
    let state = IdentityState::from_config(&config)?;
    tracing::info!(
        database = %config.database_path().display(),
        session_ttl_secs = config.token.ttl.as_secs(),
        request_timeout_secs = config.server.request_timeout.as_secs(),
        "Identity service configured"
    );

    run(identity_router(state, config.server.request_timeout), addr).await
}

/// Run the chat service.
pub async fn run_chat(config: ChatConfig) -> Result<(), BoxError> {
    let addr = config.server.socket_addr()?;
    let state = ChatState::from_config(&config)?;
    tracing::info!(
        database = %config.database_path().display(),
        identity_url = %config.identity.base_url,
        identity_concurrency = config.identity.concurrency,
        request_timeout_secs = config.server.request_timeout.as_secs(),
        "Chat service configured"
    );

    run(chat_router(state, config.server.request_timeout), addr).await
}

async fn run(router: Router, addr: SocketAddr) -> Result<(), BoxError> {
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    serve(router, addr, shutdown).await?;
    tracing::info!("Server stopped");
    Ok(())
}
