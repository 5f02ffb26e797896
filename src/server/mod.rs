//! HTTP surface. Every request carries the whole game state, so the server
//! holds nothing between calls beyond shared clients.

pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::engine::DriveMachine;
use crate::feed::backend::StrategyBackend;
use crate::feed::PlayData;

#[derive(Clone)]
pub struct AppState {
    pub machine: Arc<DriveMachine>,
    pub data: Arc<dyn PlayData>,
    pub backend: Arc<StrategyBackend>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/advance", post(handlers::advance_action))
        .route("/api/simulate", post(handlers::simulate_action))
        .route("/api/decisions", post(handlers::decisions_action))
        .route("/api/expected-points", post(handlers::expected_points_action))
        .route("/health", get(handlers::health_action))
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, "drive simulator listening");
    axum::serve(listener, router(state))
        .await
        .context("HTTP server stopped")?;
    Ok(())
}
