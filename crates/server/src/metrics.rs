//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the mediashrink server:
//! - HTTP request metrics (latency, counts)
//! - Upload ingress outcomes
//! - WebSocket observer connections
//! - Core job and notification metrics, registered from `mediashrink_core`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

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
            "mediashrink_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediashrink_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediashrink_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Upload Metrics
// =============================================================================

/// Upload attempts by outcome.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediashrink_uploads_total", "Upload attempts by outcome"),
        &["result"], // "accepted", "unsupported_type", "too_large", "invalid", "error"
    )
    .unwrap()
});

/// Bytes written to the upload directory.
pub static UPLOAD_BYTES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediashrink_upload_bytes_total",
        "Bytes stored from accepted uploads",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediashrink_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediashrink_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// Client text messages relayed to all observers.
pub static WS_MESSAGES_RELAYED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediashrink_ws_messages_relayed_total",
        "Client WebSocket messages relayed to observers",
    )
    .unwrap()
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

    // Uploads
    registry.register(Box::new(UPLOADS_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(UPLOAD_BYTES_TOTAL.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_RELAYED.clone()))
        .unwrap();

    // Core metrics (jobs, notifications)
    for metric in mediashrink_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

static STORAGE_NAME_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9a-f]{64}\.[A-Za-z0-9]+").unwrap());
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace storage names with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = STORAGE_NAME_SEGMENT.replace_all(path, "{file}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_storage_name() {
        let path = format!("/api/v1/files/{}.mp4", "ab".repeat(32));
        assert_eq!(normalize_path(&path), "/api/v1/files/{file}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/jobs/42"), "/api/v1/jobs/{id}");
        assert_eq!(normalize_path("/api/v1/jobs/42/x"), "/api/v1/jobs/{id}/x");
    }

    #[test]
    fn test_normalize_path_unchanged() {
        assert_eq!(normalize_path("/api/v1/upload"), "/api/v1/upload");
    }

    #[test]
    fn test_encode_includes_core_metrics() {
        mediashrink_core::metrics::JOBS_SUBMITTED.inc_by(0);
        let text = encode_metrics();
        assert!(text.contains("mediashrink_jobs_submitted_total"));
    }
}
