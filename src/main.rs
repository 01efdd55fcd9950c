use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use comment_notify::config::Settings;
use comment_notify::destinations::build_destinations;
use comment_notify::notify::NotifyService;
use comment_notify::server::{create_app, AppState};
use comment_notify::shutdown::{wait_for_signal, GracefulShutdown, ShutdownConfig};
use comment_notify::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    telemetry::init_tracing(&settings.logging)?;
    tracing::info!("Configuration loaded");

    // Create notifier
    let root = CancellationToken::new();
    let destinations = build_destinations(&settings.notify)?;
    let policy = settings.notify.shutdown_policy()?;
    let notifier = Arc::new(NotifyService::with_policy(
        &root,
        settings.notify.queue_capacity,
        destinations,
        policy,
    ));

    // Create Axum app
    let state = AppState::new(settings.clone(), notifier.clone());
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    // Stop notifications once no more events can arrive
    let shutdown = GracefulShutdown::with_config(
        notifier,
        ShutdownConfig {
            close_timeout: Duration::from_secs(settings.server.shutdown_timeout_seconds),
        },
    );
    shutdown.execute("server stopped").await;
    root.cancel();

    tracing::info!("Server shutdown complete");
    Ok(())
}
