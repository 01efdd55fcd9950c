//! Concrete notification channels.
//!
//! - `LogDestination`: emits a structured log event per notification
//! - `WebhookDestination`: POSTs a JSON payload to an HTTP endpoint
//!
//! Use `build_destinations()` to create the set described by configuration.

mod log;
mod webhook;

use std::collections::HashSet;
use std::sync::Arc;

pub use log::LogDestination;
pub use webhook::WebhookDestination;

use crate::config::NotifyConfig;
use crate::error::AppError;
use crate::notify::Destination;

/// Create the destinations enabled in configuration.
///
/// Returns an empty list when notifications are disabled. Destination names
/// must be unique since they label logs and metrics.
pub fn build_destinations(config: &NotifyConfig) -> Result<Vec<Arc<dyn Destination>>, AppError> {
    if !config.enabled {
        tracing::info!("Notifications disabled by configuration");
        return Ok(Vec::new());
    }

    let mut destinations: Vec<Arc<dyn Destination>> = Vec::new();

    if config.log_destination {
        destinations.push(Arc::new(LogDestination::new()));
    }

    for webhook in &config.webhooks {
        let destination = WebhookDestination::new(webhook)?;
        tracing::info!(
            name = %webhook.name,
            url = %destination.url(),
            "Creating webhook destination"
        );
        destinations.push(Arc::new(destination));
    }

    let mut seen = HashSet::new();
    for destination in &destinations {
        if !seen.insert(destination.name()) {
            return Err(AppError::InvalidDestination {
                name: destination.name().to_string(),
                reason: "duplicate destination name".to_string(),
            });
        }
    }

    Ok(destinations)
}
