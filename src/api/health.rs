//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::notify::NotifyStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub notifier: NotifierHealth,
}

#[derive(Debug, Serialize)]
pub struct NotifierHealth {
    pub enabled: bool,
    pub closed: bool,
    pub destinations: Vec<String>,
    pub queued: usize,
    pub stats: NotifyStatsSnapshot,
}

/// GET /health - liveness and notifier statistics
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let notifier = &state.notifier;
    let status = if notifier.is_closed() {
        "shutting_down"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        notifier: NotifierHealth {
            enabled: notifier.is_enabled(),
            closed: notifier.is_closed(),
            destinations: notifier.destination_names().to_vec(),
            queued: notifier.queued(),
            stats: notifier.stats(),
        },
    })
}
