//! Destination posting notifications to an HTTP endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::error::AppError;
use crate::notify::{Destination, DestinationError, Locator, NotificationRequest, User};

/// JSON body sent to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    id: Uuid,
    comment_id: &'a str,
    text: &'a str,
    locator: &'a Locator,
    user: &'a User,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
    timestamp: DateTime<Utc>,
}

impl<'a> From<&'a NotificationRequest> for WebhookPayload<'a> {
    fn from(request: &'a NotificationRequest) -> Self {
        let comment = &request.comment;
        Self {
            id: request.id,
            comment_id: &comment.id,
            text: &comment.text,
            locator: &comment.locator,
            user: &comment.user,
            parent_id: comment.parent_id.as_deref(),
            timestamp: comment.timestamp,
        }
    }
}

pub struct WebhookDestination {
    name: String,
    url: Url,
    client: Client,
}

impl WebhookDestination {
    /// Build a webhook destination from configuration
    pub fn new(config: &WebhookConfig) -> Result<Self, AppError> {
        let invalid = |reason: String| AppError::InvalidDestination {
            name: config.name.clone(),
            reason,
        };

        let url = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;

        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            name: config.name.clone(),
            url,
            client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Destination for WebhookDestination {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip_all, fields(destination = %self.name, url = %self.url))]
    async fn send(
        &self,
        cancel: CancellationToken,
        request: &NotificationRequest,
    ) -> Result<(), DestinationError> {
        let payload = WebhookPayload::from(request);

        // request and error body share one cancellation point
        let exchange = async {
            let response = self
                .client
                .post(self.url.clone())
                .json(&payload)
                .send()
                .await
                .map_err(|e| DestinationError::Transport(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                return Ok(status);
            }

            let body = response.text().await.unwrap_or_default();
            Err(DestinationError::Rejected {
                status: status.as_u16(),
                body,
            })
        };

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DestinationError::Cancelled),
            result = exchange => result?,
        };

        tracing::debug!(status = %status, "Webhook accepted notification");
        Ok(())
    }
}
