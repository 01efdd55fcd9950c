//! HTTP trigger used by the comment backend after a comment is created.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::notify::{Comment, NotificationRequest};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitCommentResponse {
    /// Always true: delivery is best-effort and drops are not reported
    pub accepted: bool,
    pub notification_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// POST /api/v1/comments - hand a created comment to the notifier
#[tracing::instrument(
    name = "http.submit_comment",
    skip(state, comment),
    fields(comment_id = %comment.id)
)]
pub async fn submit_comment(
    State(state): State<AppState>,
    Json(comment): Json<Comment>,
) -> Result<(StatusCode, Json<SubmitCommentResponse>)> {
    if comment.id.trim().is_empty() {
        return Err(AppError::Validation("comment id is required".to_string()));
    }

    let request = NotificationRequest::new(comment);
    let notification_id = request.id;
    state.notifier.submit_request(request);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitCommentResponse {
            accepted: true,
            notification_id,
            timestamp: Utc::now(),
        }),
    ))
}
