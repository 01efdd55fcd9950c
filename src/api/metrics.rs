//! Prometheus metrics endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::metrics::{self, NotifyMetrics};
use crate::server::AppState;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics - refreshes point-in-time gauges, then encodes the registry
pub async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    NotifyMetrics::set_queue_depth(state.notifier.queued());

    metrics::encode_metrics()
        .map(|body| ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode Prometheus metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        })
}
