//! Prometheus metrics for the notifier.
//!
//! - Submission metrics (accepted, dropped by reason)
//! - Dispatch metrics (fan-outs completed, fan-out duration)
//! - Destination metrics (send outcomes per destination)

mod helpers;

pub use helpers::{encode_metrics, DestinationMetrics, NotifyMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "notify";

lazy_static! {
    // ============================================================================
    // Submission Metrics
    // ============================================================================

    /// Total submissions, including dropped ones
    pub static ref SUBMITTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_submitted_total", METRIC_PREFIX),
        "Total notification submissions"
    ).unwrap();

    /// Submissions dropped before dispatch
    pub static ref DROPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dropped_total", METRIC_PREFIX),
        "Total notifications dropped before dispatch",
        &["reason"]
    ).unwrap();

    /// Requests waiting in the submission queue, refreshed on scrape
    pub static ref QUEUE_DEPTH: IntGauge = register_int_gauge!(
        format!("{}_queue_depth", METRIC_PREFIX),
        "Notifications waiting in the submission queue"
    ).unwrap();

    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Fan-outs completed by the dispatch worker
    pub static ref DISPATCHED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_dispatched_total", METRIC_PREFIX),
        "Total notifications fanned out to destinations"
    ).unwrap();

    /// Time spent fanning out a single notification
    pub static ref FANOUT_DURATION: Histogram = register_histogram!(
        format!("{}_fanout_duration_seconds", METRIC_PREFIX),
        "Duration of a notification fan-out in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Destination Metrics
    // ============================================================================

    /// Destination send outcomes
    pub static ref DESTINATION_SENDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_destination_sends_total", METRIC_PREFIX),
        "Total destination sends by outcome",
        &["destination", "outcome"]
    ).unwrap();
}
