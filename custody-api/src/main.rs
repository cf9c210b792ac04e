// custody-api/src/main.rs

//! Custody API binary.
//!
//! This binary exposes the custody-ledger verb set over HTTP:
//!
//! - `GET /health`
//! - `POST /evidence/intake`
//! - `POST /evidence/{evidence_id}/event`
//! - `POST /evidence/{evidence_id}/verify`
//! - `POST /evidence/endorse`
//! - `GET /evidence/{evidence_id}/timeline`
//! - `GET /evidence/{evidence_id}/report`
//! - `GET /case/{case_id}`
//! - `GET /case/{case_id}/audit`

mod auth;
mod config;
mod dto;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;

use config::ApiConfig;
use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "custody_api=info,custody_ledger=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::default();

    let app_state = Arc::new(
        AppState::new(&api_cfg).map_err(|e| format!("failed to initialise custody ledger state: {e}"))?,
    );

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/evidence/intake", post(routes::evidence::intake))
        .route("/evidence/{evidence_id}/event", post(routes::evidence::record_event))
        .route("/evidence/{evidence_id}/verify", post(routes::evidence::verify))
        .route("/evidence/{evidence_id}/timeline", get(routes::evidence::timeline))
        .route("/evidence/{evidence_id}/report", get(routes::evidence::report))
        .route("/evidence/endorse", post(routes::endorse::endorse))
        .route("/case/{case_id}", get(routes::case::case_summary))
        .route("/case/{case_id}/audit", get(routes::case::case_audit))
        .with_state(app_state);

    tracing::info!("custody API listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
