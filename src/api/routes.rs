use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};
use crate::triggers::submit_comment;

use super::health::health;
use super::metrics::prometheus_metrics;

pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Event intake
        .nest(
            "/api/v1",
            Router::new()
                .route("/comments", post(submit_comment))
                .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth)),
        )
}
