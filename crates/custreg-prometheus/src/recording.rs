// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// Register all custreg metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "custreg_outbox_events_recorded_total",
        "Outbox events committed together with a customer change"
    );
    describe_counter!(
        "custreg_outbox_published_total",
        "Outbox events acknowledged by the broker"
    );
    describe_counter!(
        "custreg_outbox_publish_failures_total",
        "Failed or timed out publish attempts"
    );
    describe_counter!(
        "custreg_outbox_dead_lettered_total",
        "Outbox events moved to FAILED after exhausting retries"
    );
    describe_gauge!(
        "custreg_outbox_pending",
        "PENDING outbox events observed at the end of the last relay cycle"
    );
    describe_histogram!(
        "custreg_outbox_cycle_seconds",
        Unit::Seconds,
        "Duration of one relay cycle"
    );
}

pub fn record_event_recorded(event_type: &str) {
    metrics::counter!("custreg_outbox_events_recorded_total", "event_type" => event_type.to_string())
        .increment(1);
}

/// Record a successful publish.
pub fn record_published(event_type: &str) {
    metrics::counter!("custreg_outbox_published_total", "event_type" => event_type.to_string())
        .increment(1);
}

/// Record a failed publish attempt (including timeouts).
pub fn record_publish_failure(event_type: &str) {
    metrics::counter!("custreg_outbox_publish_failures_total", "event_type" => event_type.to_string())
        .increment(1);
}

pub fn record_dead_lettered() {
    metrics::counter!("custreg_outbox_dead_lettered_total").increment(1);
}

/// Set the pending backlog gauge.
pub fn set_pending(count: u64) {
    metrics::gauge!("custreg_outbox_pending").set(count as f64);
}

pub fn record_cycle_duration(seconds: f64) {
    metrics::histogram!("custreg_outbox_cycle_seconds").record(seconds);
}
