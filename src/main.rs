// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc, time::Duration};

use hmac_request_auth::{
    api::router,
    auth::HmacVerifier,
    config::{AuthSettings, ServerSettings, LOG_FORMAT_ENV},
    state::AppState,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How often expired nonces are purged from the replay cache.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.pretty().init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let auth = match AuthSettings::from_env() {
        Ok(auth) => auth,
        Err(e) => {
            error!(error = %e, "Invalid authentication configuration");
            return ExitCode::FAILURE;
        }
    };
    let server = match ServerSettings::from_env() {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Invalid server configuration");
            return ExitCode::FAILURE;
        }
    };

    let verifier = HmacVerifier::new(&auth);
    let shutdown = CancellationToken::new();
    let sweeper = verifier
        .replay_guard()
        .spawn_sweeper(SWEEP_INTERVAL, shutdown.clone());

    let addr = server.bind_address();
    let state = match AppState::new(Arc::new(verifier), &auth.scheme, server) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to build application state");
            return ExitCode::FAILURE;
        }
    };
    let app = router(state);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        %addr,
        scheme = %auth.scheme,
        window_secs = auth.window_secs,
        "HMAC auth server listening (docs at /docs)"
    );

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown.cancel();
    let _ = sweeper.await;

    match result {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
