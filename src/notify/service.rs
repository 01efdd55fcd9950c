use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::metrics::{DestinationMetrics, NotifyMetrics};

use super::queue::{self, PushOutcome, QueueReceiver, SubmissionQueue};
use super::{Comment, Destination, DestinationError, NotificationRequest};

/// What happens to queued notifications when the service closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Cancel the in-flight fan-out and discard everything still queued
    #[default]
    Discard,
    /// Deliver queued notifications first, cancelling whatever is left after `timeout`
    Drain { timeout: Duration },
}

/// Counters for a single notifier instance
#[derive(Debug, Default)]
pub struct NotifyStats {
    /// Submit calls, including dropped ones
    pub submitted: AtomicU64,
    /// Submissions that got a queue slot
    pub enqueued: AtomicU64,
    /// Submissions dropped because the queue was full
    pub dropped_full: AtomicU64,
    /// Submissions dropped because the service was closed or disabled
    pub dropped_closed: AtomicU64,
    /// Queued notifications discarded at shutdown
    pub discarded: AtomicU64,
    /// Notifications fanned out to destinations
    pub dispatched: AtomicU64,
    pub send_ok: AtomicU64,
    pub send_failed: AtomicU64,
    pub send_cancelled: AtomicU64,
}

impl NotifyStats {
    pub fn snapshot(&self) -> NotifyStatsSnapshot {
        NotifyStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            dropped_closed: self.dropped_closed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            send_ok: self.send_ok.load(Ordering::Relaxed),
            send_failed: self.send_failed.load(Ordering::Relaxed),
            send_cancelled: self.send_cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of notifier statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotifyStatsSnapshot {
    pub submitted: u64,
    pub enqueued: u64,
    pub dropped_full: u64,
    pub dropped_closed: u64,
    pub discarded: u64,
    pub dispatched: u64,
    pub send_ok: u64,
    pub send_failed: u64,
    pub send_cancelled: u64,
}

/// Asynchronous notification fan-out service.
///
/// `submit` never blocks: requests go into a bounded queue or are dropped.
/// A single worker task drains the queue in FIFO order and sends each request
/// to every destination concurrently, waiting for all of them before picking
/// up the next one. `close` cancels the in-flight fan-out and waits for the
/// worker to exit.
pub struct NotifyService {
    queue: Option<SubmissionQueue>,
    destination_names: Vec<String>,
    cancel: CancellationToken,
    drain: CancellationToken,
    policy: ShutdownPolicy,
    closed: AtomicBool,
    /// Flips to true, or loses its sender, once the worker has exited
    worker_exited: Option<watch::Receiver<bool>>,
    stats: Arc<NotifyStats>,
}

impl NotifyService {
    /// Create a notifier and start its dispatch worker.
    ///
    /// The service token is a child of `parent`, so cancelling the parent scope
    /// stops dispatching as well. Must be called within a Tokio runtime unless
    /// `destinations` is empty.
    pub fn new(
        parent: &CancellationToken,
        capacity: usize,
        destinations: Vec<Arc<dyn Destination>>,
    ) -> Self {
        Self::with_policy(parent, capacity, destinations, ShutdownPolicy::default())
    }

    /// Create a notifier with an explicit shutdown policy
    pub fn with_policy(
        parent: &CancellationToken,
        capacity: usize,
        destinations: Vec<Arc<dyn Destination>>,
        policy: ShutdownPolicy,
    ) -> Self {
        let cancel = parent.child_token();
        let drain = CancellationToken::new();
        let stats = Arc::new(NotifyStats::default());
        let destination_names: Vec<String> =
            destinations.iter().map(|d| d.name().to_string()).collect();

        if destinations.is_empty() {
            tracing::info!("No notification destinations configured, notifications disabled");
            return Self {
                queue: None,
                destination_names,
                cancel,
                drain,
                policy,
                closed: AtomicBool::new(false),
                worker_exited: None,
                stats,
            };
        }

        let (queue, receiver) = queue::bounded(capacity);
        let (exited_tx, exited_rx) = watch::channel(false);
        let worker = DispatchWorker {
            receiver,
            destinations: destinations.into(),
            cancel: cancel.clone(),
            drain: drain.clone(),
            stats: stats.clone(),
            exited: exited_tx,
        };
        tokio::spawn(worker.run());

        tracing::info!(
            capacity = capacity,
            destinations = ?destination_names,
            policy = ?policy,
            "Notification service started"
        );

        Self {
            queue: Some(queue),
            destination_names,
            cancel,
            drain,
            policy,
            closed: AtomicBool::new(false),
            worker_exited: Some(exited_rx),
            stats,
        }
    }

    /// A notifier with no destinations and no worker.
    ///
    /// Accepts and drops every submission. Each call returns a fresh instance.
    pub fn disabled() -> Self {
        Self::new(&CancellationToken::new(), 0, Vec::new())
    }

    /// Submit a comment for notification. Never blocks and never fails.
    pub fn submit(&self, comment: Comment) {
        self.submit_request(NotificationRequest::new(comment));
    }

    /// Submit a prepared request. Never blocks and never fails.
    pub fn submit_request(&self, request: NotificationRequest) {
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        NotifyMetrics::record_submitted();

        let Some(queue) = self.queue.as_ref() else {
            tracing::trace!(comment_id = %request.comment.id, "Notifications disabled, submission dropped");
            self.stats.dropped_closed.fetch_add(1, Ordering::Relaxed);
            NotifyMetrics::record_dropped_closed();
            return;
        };

        if self.is_closed() || self.cancel.is_cancelled() {
            tracing::debug!(comment_id = %request.comment.id, "Notifier closed, submission dropped");
            self.stats.dropped_closed.fetch_add(1, Ordering::Relaxed);
            NotifyMetrics::record_dropped_closed();
            return;
        }

        let notification_id = request.id;
        let comment_id = request.comment.id.clone();
        match queue.try_push(request) {
            PushOutcome::Enqueued => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    notification_id = %notification_id,
                    comment_id = %comment_id,
                    "Notification queued"
                );
            }
            PushOutcome::Full => {
                self.stats.dropped_full.fetch_add(1, Ordering::Relaxed);
                NotifyMetrics::record_dropped_full();
                tracing::warn!(
                    notification_id = %notification_id,
                    comment_id = %comment_id,
                    capacity = queue.capacity(),
                    "Notification queue full, submission dropped"
                );
            }
            PushOutcome::Closed => {
                self.stats.dropped_closed.fetch_add(1, Ordering::Relaxed);
                NotifyMetrics::record_dropped_closed();
                tracing::debug!(comment_id = %comment_id, "Dispatch worker gone, submission dropped");
            }
        }
    }

    /// Shut the notifier down and wait for the worker to exit.
    ///
    /// Idempotent. Every caller, including concurrent ones and retries after a
    /// dropped `close` future, returns only once the worker has terminated.
    /// Afterwards `submit` keeps working but discards.
    pub async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.begin_shutdown();
        }

        let Some(exited) = self.worker_exited.as_ref() else {
            return;
        };
        let mut exited = exited.clone();
        // a dropped sender also means the worker is gone
        if exited.wait_for(|done| *done).await.is_err() {
            tracing::debug!("Dispatch worker exited without reporting");
        }
    }

    /// Signal the worker according to the shutdown policy. Runs once.
    fn begin_shutdown(&self) {
        if self.worker_exited.is_none() {
            self.cancel.cancel();
            tracing::info!("Notification service closed");
            return;
        }

        match self.policy {
            ShutdownPolicy::Discard => {
                tracing::info!("Closing notification service, discarding queued notifications");
                self.cancel.cancel();
            }
            ShutdownPolicy::Drain { timeout } => {
                tracing::info!(
                    queued = self.queued(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Closing notification service, draining queue"
                );
                self.drain.cancel();

                // deadline lives outside `close` so a dropped caller cannot skip it
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(timeout) => {
                            tracing::warn!(
                                timeout_ms = timeout.as_millis() as u64,
                                "Queue drain timed out, cancelling in-flight notification"
                            );
                            cancel.cancel();
                        }
                    }
                });
            }
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether any destination is configured
    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    /// Names of the configured destinations
    pub fn destination_names(&self) -> &[String] {
        &self.destination_names
    }

    /// Notifications currently waiting in the queue
    pub fn queued(&self) -> usize {
        self.queue.as_ref().map_or(0, SubmissionQueue::len)
    }

    pub fn stats(&self) -> NotifyStatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for NotifyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyService")
            .field("destinations", &self.destination_names)
            .field("policy", &self.policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The single consumer of the submission queue
struct DispatchWorker {
    receiver: QueueReceiver,
    destinations: Arc<[Arc<dyn Destination>]>,
    cancel: CancellationToken,
    drain: CancellationToken,
    stats: Arc<NotifyStats>,
    exited: watch::Sender<bool>,
}

impl DispatchWorker {
    async fn run(mut self) {
        tracing::debug!("Dispatch worker started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.drain.cancelled() => {
                    self.drain_queue().await;
                    break;
                }
                request = self.receiver.recv() => match request {
                    Some(request) => self.fan_out(request).await,
                    None => break,
                }
            }
        }

        let discarded = self.receiver.close();
        if discarded > 0 {
            self.stats
                .discarded
                .fetch_add(discarded as u64, Ordering::Relaxed);
            NotifyMetrics::record_discarded(discarded as u64);
            tracing::info!(discarded = discarded, "Discarded queued notifications on shutdown");
        }

        // releases a pending drain deadline
        self.cancel.cancel();
        self.exited.send_replace(true);
        tracing::info!("Dispatch worker stopped");
    }

    /// Deliver whatever is already queued, stopping early on cancellation
    async fn drain_queue(&mut self) {
        while !self.cancel.is_cancelled() {
            let Some(request) = self.receiver.try_recv() else {
                break;
            };
            self.fan_out(request).await;
        }
    }

    /// Send one request to every destination concurrently and wait for all of them
    #[tracing::instrument(
        name = "notify.fan_out",
        skip_all,
        fields(notification_id = %request.id, comment_id = %request.comment.id)
    )]
    async fn fan_out(&self, request: NotificationRequest) {
        let start = Instant::now();
        let request = Arc::new(request);
        let token = self.cancel.child_token();
        let mut sends = JoinSet::new();

        for destination in self.destinations.iter() {
            let destination = Arc::clone(destination);
            let request = Arc::clone(&request);
            let token = token.clone();

            sends.spawn(
                async move {
                    let result = AssertUnwindSafe(destination.send(token, &request))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            Err(DestinationError::Other("destination panicked".to_string()))
                        });
                    (destination, result)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((destination, result)) => self.record_outcome(destination.name(), result),
                Err(e) => {
                    self.stats.send_failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(error = %e, "Destination send task failed");
                }
            }
        }

        let elapsed = start.elapsed();
        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
        NotifyMetrics::record_dispatched(elapsed.as_secs_f64());
        tracing::debug!(
            destinations = self.destinations.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Notification fan-out finished"
        );
    }

    fn record_outcome(&self, destination: &str, result: Result<(), DestinationError>) {
        match result {
            Ok(()) => {
                self.stats.send_ok.fetch_add(1, Ordering::Relaxed);
                DestinationMetrics::record(destination, "ok");
                tracing::debug!(destination = %destination, "Notification delivered");
            }
            Err(e @ DestinationError::Cancelled) => {
                self.stats.send_cancelled.fetch_add(1, Ordering::Relaxed);
                DestinationMetrics::record(destination, e.outcome());
                tracing::info!(destination = %destination, "Notification send cancelled");
            }
            Err(e) => {
                self.stats.send_failed.fetch_add(1, Ordering::Relaxed);
                DestinationMetrics::record(destination, e.outcome());
                tracing::warn!(
                    destination = %destination,
                    error = %e,
                    "Failed to send notification"
                );
            }
        }
    }
}
