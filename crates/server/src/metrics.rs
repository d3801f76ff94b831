//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the shorts server:
//! - HTTP request metrics (latency, counts)
//! - Script and topic counts by status (collected on scrape)
//! - Pipeline stage metrics registered by the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

use shorts_core::record::{ScriptFilter, ScriptStatus, TopicFilter, TopicStatus};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shorts_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.05, 0.25, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shorts_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shorts_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Record Metrics (collected dynamically)
// =============================================================================

/// Scripts by current status.
pub static SCRIPTS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("shorts_scripts_by_status", "Current script count by status"),
        &["status"],
    )
    .unwrap()
});

/// Topics still waiting for a script.
pub static TOPICS_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("shorts_topics_pending", "Topics without a script").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Records
    registry
        .register(Box::new(SCRIPTS_BY_STATUS.clone()))
        .unwrap();
    registry.register(Box::new(TOPICS_PENDING.clone())).unwrap();

    // Core metrics (stages, collaborators, media processes)
    for metric in shorts_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh the record gauges from the store before a scrape.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let store = state.store();
    for status in ScriptStatus::ALL {
        let filter = ScriptFilter::new().with_status(status);
        if let Ok(count) = store.count_scripts(&filter) {
            SCRIPTS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count);
        }
    }

    // Unbounded page: counts every pending topic.
    let filter = TopicFilter::new()
        .with_status(TopicStatus::Pending)
        .with_limit(i64::MAX);
    if let Ok(topics) = store.list_topics(&filter) {
        TOPICS_PENDING.set(topics.len() as i64);
    }
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static ASSET_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/assets/.*$").unwrap());

/// Normalize a path for metric labels (replace ids and asset keys).
pub fn normalize_path(path: &str) -> String {
    let result = ASSET_PATH.replace(path, "/assets/{key}");
    let result = UUID_SEGMENT.replace_all(&result, "{id}");
    result.to_string()
}
