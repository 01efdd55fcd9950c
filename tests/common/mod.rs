//! Shared test destinations.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use comment_notify::notify::{Destination, DestinationError, NotificationRequest};

/// Records comment IDs after a fixed processing delay, unless cancelled first
pub struct MockDestination {
    name: String,
    delay: Duration,
    /// Time spent cleaning up after cancellation before returning
    wind_down: Duration,
    fail: bool,
    received: Mutex<Vec<String>>,
    cancelled: AtomicBool,
}

impl MockDestination {
    fn build(name: &str, delay: Duration, wind_down: Duration, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            delay,
            wind_down,
            fail,
            received: Mutex::new(Vec::new()),
            cancelled: AtomicBool::new(false),
        })
    }

    pub fn new(name: &str, delay: Duration) -> Arc<Self> {
        Self::build(name, delay, Duration::ZERO, false)
    }

    /// A destination that records the attempt and then reports an error
    pub fn failing(name: &str, delay: Duration) -> Arc<Self> {
        Self::build(name, delay, Duration::ZERO, true)
    }

    /// A destination that needs `wind_down` to return once cancelled
    pub fn slow_to_cancel(name: &str, delay: Duration, wind_down: Duration) -> Arc<Self> {
        Self::build(name, delay, wind_down, false)
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Destination for MockDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        cancel: CancellationToken,
        request: &NotificationRequest,
    ) -> Result<(), DestinationError> {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {
                self.received.lock().unwrap().push(request.comment.id.clone());
                if self.fail {
                    Err(DestinationError::Other(format!("{} is down", self.name)))
                } else {
                    Ok(())
                }
            }
            _ = cancel.cancelled() => {
                tokio::time::sleep(self.wind_down).await;
                self.cancelled.store(true, Ordering::SeqCst);
                Err(DestinationError::Cancelled)
            }
        }
    }
}

pub fn as_destinations(mocks: &[Arc<MockDestination>]) -> Vec<Arc<dyn Destination>> {
    mocks
        .iter()
        .map(|m| m.clone() as Arc<dyn Destination>)
        .collect()
}
