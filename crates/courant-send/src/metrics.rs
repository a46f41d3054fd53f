//! Observability metrics for send orchestration.
//!
//! Metrics are exported via the `metrics` crate facade. They support:
//!
//! - **Alerting**: stuck campaigns (exhausted retries) and lock contention
//! - **Dashboards**: fan-out throughput and per-recipient outcome rates
//! - **Debugging**: correlating counts with traces for root cause analysis
//!
//! ## Metrics Exported
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `courant_send_lock_attempts_total` | Counter | `outcome` | Lock CAS attempts by outcome |
//! | `courant_send_batches_enqueued_total` | Counter | - | Batch envelopes enqueued |
//! | `courant_send_retries_total` | Counter | - | Orchestration retries |
//! | `courant_send_campaigns_stuck_total` | Counter | - | Campaigns left scheduled after exhausted retries |
//! | `courant_send_recipients_total` | Counter | `outcome` | Per-recipient dispatch outcomes |
//! | `courant_send_dispatch_queue_depth` | Gauge | - | Envelopes waiting in the dispatch queue |
//!
//! ## Integration
//!
//! To export to Prometheus, install a recorder at process start:
//!
//! ```rust,ignore
//! use metrics_exporter_prometheus::PrometheusBuilder;
//!
//! PrometheusBuilder::new()
//!     .with_http_listener(([0, 0, 0, 0], 9090))
//!     .install()
//!     .expect("failed to install Prometheus recorder");
//! ```

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: Lock CAS attempts by outcome.
    pub const LOCK_ATTEMPTS_TOTAL: &str = "courant_send_lock_attempts_total";
    /// Counter: Batch envelopes enqueued.
    pub const BATCHES_ENQUEUED_TOTAL: &str = "courant_send_batches_enqueued_total";
    /// Counter: Orchestration retries.
    pub const RETRIES_TOTAL: &str = "courant_send_retries_total";
    /// Counter: Campaigns left scheduled after exhausted retries.
    pub const CAMPAIGNS_STUCK_TOTAL: &str = "courant_send_campaigns_stuck_total";
    /// Counter: Per-recipient dispatch outcomes.
    pub const RECIPIENTS_TOTAL: &str = "courant_send_recipients_total";
    /// Gauge: Envelopes waiting in the dispatch queue.
    pub const DISPATCH_QUEUE_DEPTH: &str = "courant_send_dispatch_queue_depth";
}

/// Recorder for send-pipeline metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendMetrics;

impl SendMetrics {
    /// Creates a new metrics recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Records a lock CAS attempt (`outcome`: "acquired" or "lost").
    pub fn record_lock_attempt(&self, outcome: &'static str) {
        counter!(names::LOCK_ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
    }

    /// Records enqueued batch envelopes.
    pub fn record_batches_enqueued(&self, count: u64) {
        counter!(names::BATCHES_ENQUEUED_TOTAL).increment(count);
    }

    /// Records one orchestration retry.
    pub fn record_retry(&self) {
        counter!(names::RETRIES_TOTAL).increment(1);
    }

    /// Records a campaign left stuck in `scheduled` after exhausted retries.
    pub fn record_campaign_stuck(&self) {
        counter!(names::CAMPAIGNS_STUCK_TOTAL).increment(1);
    }

    /// Records a per-recipient outcome (`outcome`: "sent" or "failed").
    pub fn record_recipient(&self, outcome: &'static str) {
        counter!(names::RECIPIENTS_TOTAL, "outcome" => outcome).increment(1);
    }

    /// Updates the dispatch queue depth gauge.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_dispatch_queue_depth(&self, depth: usize) {
        gauge!(names::DISPATCH_QUEUE_DEPTH).set(depth as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The facade is a no-op without an installed recorder; these only assert
    // the calls don't panic.
    #[test]
    fn recording_without_recorder_is_safe() {
        let metrics = SendMetrics::new();
        metrics.record_lock_attempt("acquired");
        metrics.record_batches_enqueued(3);
        metrics.record_retry();
        metrics.record_campaign_stuck();
        metrics.record_recipient("sent");
        metrics.set_dispatch_queue_depth(42);
    }
}
