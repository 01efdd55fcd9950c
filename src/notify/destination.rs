use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::NotificationRequest;

/// Error returned by a destination send
#[derive(Debug, Clone, Error)]
pub enum DestinationError {
    #[error("send cancelled")]
    Cancelled,

    #[error("rejected by remote: status {status}, body: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

impl DestinationError {
    /// Outcome label used for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            _ => "error",
        }
    }
}

/// A channel able to deliver notifications (chat bot, email, webhook, ...).
///
/// Implementations must return promptly once `cancel` fires. They may take
/// arbitrary time otherwise. Errors are logged by the service and never retried.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Human-readable identifier used in logs and metrics
    fn name(&self) -> &str;

    /// Attempt delivery of a single notification
    async fn send(
        &self,
        cancel: CancellationToken,
        request: &NotificationRequest,
    ) -> Result<(), DestinationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_outcome() {
        assert_eq!(DestinationError::Cancelled.outcome(), "cancelled");
        assert_eq!(DestinationError::Transport("refused".into()).outcome(), "error");
        assert_eq!(
            DestinationError::Rejected {
                status: 500,
                body: String::new()
            }
            .outcome(),
            "error"
        );
    }
}
