//! Bounded, non-blocking submission queue.
//!
//! Producers never wait: a push either lands in a free slot or the item is
//! dropped (drop-newest). A capacity of zero turns the queue into a rendezvous
//! where an item is accepted only while the consumer is parked waiting for input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use super::NotificationRequest;

/// Result of a non-blocking push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Item is queued for dispatch
    Enqueued,
    /// No free slot, item dropped
    Full,
    /// Consumer is gone, item dropped
    Closed,
}

/// Producer side of the queue
#[derive(Debug, Clone)]
pub struct SubmissionQueue {
    tx: mpsc::Sender<NotificationRequest>,
    capacity: usize,
    consumer_idle: Arc<AtomicBool>,
}

/// Consumer side of the queue, owned by the single dispatch worker
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<NotificationRequest>,
    rendezvous: bool,
    consumer_idle: Arc<AtomicBool>,
}

/// Create a queue holding at most `capacity` pending requests
pub fn bounded(capacity: usize) -> (SubmissionQueue, QueueReceiver) {
    // mpsc rejects a zero-sized buffer; rendezvous mode gates a single slot instead
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let consumer_idle = Arc::new(AtomicBool::new(false));

    (
        SubmissionQueue {
            tx,
            capacity,
            consumer_idle: consumer_idle.clone(),
        },
        QueueReceiver {
            rx,
            rendezvous: capacity == 0,
            consumer_idle,
        },
    )
}

impl SubmissionQueue {
    /// Try to insert without waiting
    pub fn try_push(&self, request: NotificationRequest) -> PushOutcome {
        if self.capacity == 0
            && self
                .consumer_idle
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return if self.tx.is_closed() {
                PushOutcome::Closed
            } else {
                PushOutcome::Full
            };
        }

        match self.tx.try_send(request) {
            Ok(()) => PushOutcome::Enqueued,
            Err(TrySendError::Full(_)) => PushOutcome::Full,
            Err(TrySendError::Closed(_)) => PushOutcome::Closed,
        }
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of requests waiting for the worker
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueueReceiver {
    /// Wait for the next request. Cancel safe.
    pub async fn recv(&mut self) -> Option<NotificationRequest> {
        if self.rendezvous {
            self.consumer_idle.store(true, Ordering::Release);
        }
        self.rx.recv().await
    }

    /// Take the next request if one is already queued
    pub fn try_recv(&mut self) -> Option<NotificationRequest> {
        match self.rx.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Stop accepting pushes and return how many requests were still queued
    pub fn close(&mut self) -> usize {
        self.consumer_idle.store(false, Ordering::Release);
        self.rx.close();
        let mut discarded = 0;
        while self.try_recv().is_some() {
            discarded += 1;
        }
        discarded
    }
}
