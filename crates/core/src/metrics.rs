//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Transcode jobs (submissions, outcomes, end-to-end duration)
//! - Observer notifications (registrations, deliveries, drops)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs handed to the coordinator.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediashrink_jobs_submitted_total",
        "Total transcode jobs submitted",
    )
    .unwrap()
});

/// Jobs currently running.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediashrink_jobs_active", "Transcode jobs currently running").unwrap()
});

/// Terminal job results by status.
pub static JOB_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediashrink_job_results_total", "Terminal job results"),
        &["status"], // "compressed", "skipped", "failed"
    )
    .unwrap()
});

/// Time from submission to terminal result, in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediashrink_job_duration_seconds",
            "Time from upload acceptance to terminal result",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Notifications
// =============================================================================

/// Observers currently registered.
pub static OBSERVERS_REGISTERED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediashrink_observers_registered",
        "Observers currently registered for notifications",
    )
    .unwrap()
});

/// Notifications queued to an observer.
pub static NOTIFICATIONS_DELIVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediashrink_notifications_delivered_total",
        "Notifications queued to observers",
    )
    .unwrap()
});

/// Observers dropped because delivery failed.
pub static OBSERVERS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediashrink_observers_dropped_total",
            "Observers removed after a failed delivery",
        ),
        &["reason"], // "full", "closed"
    )
    .unwrap()
});

/// Relayed client messages not queued because an observer's relay queue was full.
pub static RELAY_MESSAGES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediashrink_relay_messages_skipped_total",
        "Relayed client messages skipped for observers with a full relay queue",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        Box::new(JOB_RESULTS.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(OBSERVERS_REGISTERED.clone()),
        Box::new(NOTIFICATIONS_DELIVERED.clone()),
        Box::new(OBSERVERS_DROPPED.clone()),
        Box::new(RELAY_MESSAGES_SKIPPED.clone()),
    ]
}
