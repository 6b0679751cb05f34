//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (per-document outcomes and durations)
//! - Batches (sizes)
//! - Background tasks (submissions and terminal outcomes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Document conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "papermill_conversions_total",
            "Total document conversions",
        ),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "papermill_conversion_duration_seconds",
            "Duration of single document conversions",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Batch sizes.
pub static BATCH_SIZE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "papermill_batch_size",
            "Number of documents per batch request",
        )
        .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Background Task Metrics
// =============================================================================

/// Tasks submitted for background conversion.
pub static TASKS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "papermill_tasks_submitted_total",
        "Total background tasks submitted",
    )
    .unwrap()
});

/// Tasks reaching a terminal state, by outcome.
pub static TASKS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "papermill_tasks_finished_total",
            "Total background tasks reaching a terminal state",
        ),
        &["status"], // "completed", "failed"
    )
    .unwrap()
});

/// Returns all core metrics for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(BATCH_SIZE.clone()),
        Box::new(TASKS_SUBMITTED.clone()),
        Box::new(TASKS_FINISHED.clone()),
    ]
}
