use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::error::AppError;

/// Header carrying the shared secret of the comment backend
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Rejects event intake requests without the configured `api.key`.
///
/// When no key is configured every request passes.
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected_key) = state.settings.api.key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == expected_key => Ok(next.run(req).await),
        Some(_) => Err(AppError::Auth("invalid API key".to_string())),
        None => Err(AppError::Auth(format!("missing {} header", API_KEY_HEADER))),
    }
}
