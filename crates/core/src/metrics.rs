//! Prometheus metrics for a provisioning run.
//!
//! This module provides metrics for:
//! - REST requests sent to GeoServer (counts and latency)
//! - Readiness probes
//! - Step outcomes

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for collector in all_metrics() {
        // Collectors are only registered here, so duplicates cannot occur.
        let _ = registry.register(collector);
    }
    registry
});

// =============================================================================
// REST Request Metrics
// =============================================================================

/// REST requests total by method and status ("error" for transport failures).
pub static REST_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("geoinit_rest_requests_total", "Total GeoServer REST requests"),
        &["method", "status"],
    )
    .unwrap()
});

/// REST request duration in seconds.
pub static REST_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "geoinit_rest_request_duration_seconds",
            "GeoServer REST request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method"],
    )
    .unwrap()
});

// =============================================================================
// Sequencer Metrics
// =============================================================================

/// Readiness probes sent.
pub static READINESS_PROBES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "geoinit_readiness_probes_total",
        "Readiness probes sent to GeoServer",
    )
    .unwrap()
});

/// Step outcomes by step and outcome.
pub static STEP_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("geoinit_step_outcomes_total", "Provisioning step outcomes"),
        &["step", "outcome"], // "created", "updated", "already_exists", "warning", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(REST_REQUESTS_TOTAL.clone()),
        Box::new(REST_REQUEST_DURATION.clone()),
        Box::new(READINESS_PROBES.clone()),
        Box::new(STEP_OUTCOMES.clone()),
    ]
}

/// Record a finished REST exchange.
pub fn record_request(method: &str, status: &str, duration_secs: f64) {
    REST_REQUESTS_TOTAL
        .with_label_values(&[method, status])
        .inc();
    REST_REQUEST_DURATION
        .with_label_values(&[method])
        .observe(duration_secs);
}

/// Record the outcome of a step.
pub fn record_step(step: &str, outcome: &str) {
    STEP_OUTCOMES.with_label_values(&[step, outcome]).inc();
}

/// Encode all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
