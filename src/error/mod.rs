use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid destination '{name}': {reason}")]
    InvalidDestination { name: String, reason: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

/// Deployments running with RUN_MODE=production hide server-side details
fn is_production() -> bool {
    matches!(
        std::env::var("RUN_MODE").as_deref(),
        Ok("production") | Ok("prod")
    )
}

impl AppError {
    /// HTTP status and stable machine-readable code
    pub fn status_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config(_) | Self::InvalidDestination { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
            Self::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message safe to return to the caller
    fn client_message(&self) -> String {
        match self {
            Self::Auth(msg) | Self::Validation(msg) => msg.clone(),
            _ if is_production() => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = code, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.client_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
