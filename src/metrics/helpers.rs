//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    DESTINATION_SENDS_TOTAL, DISPATCHED_TOTAL, DROPPED_TOTAL, FANOUT_DURATION, QUEUE_DEPTH,
    SUBMITTED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording submission and dispatch metrics
pub struct NotifyMetrics;

impl NotifyMetrics {
    pub fn record_submitted() {
        SUBMITTED_TOTAL.inc();
    }

    /// Record a notification dropped because the queue had no free slot
    pub fn record_dropped_full() {
        DROPPED_TOTAL.with_label_values(&["queue_full"]).inc();
    }

    /// Record a notification dropped because the service was closed
    pub fn record_dropped_closed() {
        DROPPED_TOTAL.with_label_values(&["closed"]).inc();
    }

    /// Record queued notifications discarded at shutdown
    pub fn record_discarded(count: u64) {
        DROPPED_TOTAL.with_label_values(&["shutdown"]).inc_by(count);
    }

    pub fn record_dispatched(duration_secs: f64) {
        DISPATCHED_TOTAL.inc();
        FANOUT_DURATION.observe(duration_secs);
    }

    /// Refresh the queue depth gauge from the notifier
    pub fn set_queue_depth(depth: usize) {
        QUEUE_DEPTH.set(depth as i64);
    }
}

/// Helper struct for recording destination send outcomes
pub struct DestinationMetrics;

impl DestinationMetrics {
    pub fn record(destination: &str, outcome: &str) {
        DESTINATION_SENDS_TOTAL
            .with_label_values(&[destination, outcome])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_recorded_metrics() {
        NotifyMetrics::record_submitted();
        NotifyMetrics::set_queue_depth(3);
        DestinationMetrics::record("helpers-test", "ok");

        let output = encode_metrics().unwrap();
        assert!(output.contains("notify_submitted_total"));
        assert!(output.contains("notify_queue_depth"));
        assert!(output.contains("destination=\"helpers-test\""));
    }
}
