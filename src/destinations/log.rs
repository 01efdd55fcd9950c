//! A destination that records every notification as a log event.
//!
//! Useful for debugging the pipeline and for deployments where an external
//! log shipper turns log lines into alerts.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::notify::{Destination, DestinationError, NotificationRequest};

pub struct LogDestination {
    name: String,
}

impl LogDestination {
    pub fn new() -> Self {
        Self {
            name: "log".to_string(),
        }
    }
}

impl Default for LogDestination {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Destination for LogDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        cancel: CancellationToken,
        request: &NotificationRequest,
    ) -> Result<(), DestinationError> {
        if cancel.is_cancelled() {
            return Err(DestinationError::Cancelled);
        }

        let comment = &request.comment;
        tracing::info!(
            notification_id = %request.id,
            comment_id = %comment.id,
            site = %comment.locator.site,
            url = %comment.locator.url,
            user = %comment.user.name,
            reply_to = ?comment.parent_id,
            "New comment"
        );
        Ok(())
    }
}
