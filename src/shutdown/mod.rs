//! Graceful shutdown handling for the notifier.
//!
//! The HTTP server stops accepting events first (handled by axum), then the
//! notifier is closed: the in-flight fan-out is cancelled or the queue is
//! drained, depending on the configured policy.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;

use crate::notify::NotifyService;

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time to wait for the notifier to close (default: 15 seconds)
    pub close_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            close_timeout: Duration::from_secs(15),
        }
    }
}

/// Closes the notifier within a bounded time
pub struct GracefulShutdown {
    notifier: Arc<NotifyService>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(notifier: Arc<NotifyService>) -> Self {
        Self::with_config(notifier, ShutdownConfig::default())
    }

    pub fn with_config(notifier: Arc<NotifyService>, config: ShutdownConfig) -> Self {
        Self { notifier, config }
    }

    /// Execute the shutdown sequence
    #[tracing::instrument(name = "graceful_shutdown", skip(self))]
    pub async fn execute(&self, reason: &str) -> ShutdownResult {
        let start = std::time::Instant::now();
        let before = self.notifier.stats();

        tracing::info!(
            reason = %reason,
            queued = self.notifier.queued(),
            "Closing notification service"
        );

        let notifier_closed = timeout(self.config.close_timeout, self.notifier.close())
            .await
            .is_ok();

        if !notifier_closed {
            tracing::warn!(
                timeout_secs = self.config.close_timeout.as_secs(),
                "Notification service did not close in time"
            );
        }

        let after = self.notifier.stats();
        let result = ShutdownResult {
            notifier_closed,
            discarded: after.discarded.saturating_sub(before.discarded),
            duration: start.elapsed(),
        };

        tracing::info!(
            notifier_closed = result.notifier_closed,
            discarded = result.discarded,
            duration_ms = result.duration.as_millis() as u64,
            "Graceful shutdown completed"
        );

        result
    }
}

/// Result of a graceful shutdown operation
#[derive(Debug, Default)]
pub struct ShutdownResult {
    /// Whether the notifier worker exited within the timeout
    pub notifier_closed: bool,
    /// Queued notifications discarded during shutdown
    pub discarded: u64,
    /// Total time taken for shutdown
    pub duration: Duration,
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
