//! Prometheus metrics for the txtpages server.
//!
//! Exposes page creation, edit and view counts, touch failures, and
//! expiry sweep results.
//!
//! The `/metrics` endpoint is unauthenticated and only mounted when
//! `server.metrics_enabled` is set. Restrict it to the scraper at the
//! network level.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Page metrics
pub static PAGES_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("txtpages_pages_created_total", "Total number of pages created")
        .expect("metric creation failed")
});

pub static PAGES_EDITED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("txtpages_pages_edited_total", "Total number of successful page edits")
        .expect("metric creation failed")
});

pub static PAGE_VIEWS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("txtpages_page_views_total", "Total page views by page kind"),
        &["kind"],
    )
    .expect("metric creation failed")
});

pub static TOUCH_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "txtpages_touch_failures_total",
        "Reads whose last-read timestamp could not be updated",
    )
    .expect("metric creation failed")
});

// Sweep metrics
pub static PAGES_PURGED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "txtpages_pages_purged_total",
        "Total number of pages removed by the expiry sweeper",
    )
    .expect("metric creation failed")
});

pub static SWEEPS_SKIPPED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "txtpages_sweeps_skipped_total",
        "Sweep ticks skipped because a sweep was still running",
    )
    .expect("metric creation failed")
});

pub static SWEEP_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("txtpages_sweep_failures_total", "Total number of failed sweeps")
        .expect("metric creation failed")
});

pub static SWEEP_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "txtpages_sweep_duration_seconds",
            "Time taken by one expiry sweep",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
    )
    .expect("metric creation failed")
});

// Error metrics
pub static STORE_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "txtpages_store_errors_total",
            "Page store failures by operation",
        ),
        &["operation"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so tests and embedded routers can call it freely.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(PAGES_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PAGES_EDITED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PAGE_VIEWS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TOUCH_FAILURES.clone()))
            .expect("metric registration failed");

        REGISTRY
            .register(Box::new(PAGES_PURGED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SWEEPS_SKIPPED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SWEEP_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SWEEP_DURATION.clone()))
            .expect("metric registration failed");

        REGISTRY
            .register(Box::new(STORE_ERRORS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Count a failed store operation.
pub fn record_store_error(operation: &str) {
    STORE_ERRORS.with_label_values(&[operation]).inc();
}

/// Count a page view; `kind` is "stored" or "stock".
pub fn record_page_view(kind: &str) {
    PAGE_VIEWS.with_label_values(&[kind]).inc();
}
