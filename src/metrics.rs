// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for target group reconciliation.
//!
//! All metrics carry the namespace prefix `alb_targetgroup_`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Outcomes and durations of reconcile calls
//! - **Error Metrics** - Failures by reconciliation stage
//! - **Provider Metrics** - Mutating provider calls by operation
//!
//! # Example
//!
//! ```rust,no_run
//! use alb_targetgroup::metrics::{gather_metrics, record_reconciliation_success};
//!
//! record_reconciliation_success(std::time::Duration::from_millis(250));
//! println!("{}", gather_metrics().unwrap());
//! ```

use crate::errors::Stage;
use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "alb_targetgroup";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconcile calls by outcome
///
/// Labels:
/// - `status`: Outcome (`success`, `error`, `cancelled`)
pub static RECONCILIATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of target group reconciliations by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconcile calls in seconds, regardless of outcome
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of target group reconciliations in seconds",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of failed reconciles by the stage that failed
///
/// Labels:
/// - `stage`: `configuration`, `lookup`, `creation`, `modification`, `tags`, `attributes` or `targets`
pub static STAGE_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_stage_errors_total"),
        "Total number of reconciliation failures by stage",
    );
    let counter = CounterVec::new(opts, &["stage"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Provider Metrics
// ============================================================================

/// Total number of mutating provider calls
///
/// Labels:
/// - `operation`: e.g. `create`, `modify`, `add_tags`, `register_targets`
pub static PROVIDER_MUTATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_provider_mutations_total"),
        "Total number of mutating provider calls by operation",
    );
    let counter = CounterVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconcile
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATIONS_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a failed reconcile
///
/// # Arguments
/// * `stage` - The stage that failed
/// * `cancelled` - Whether the failure was a caller cancellation
/// * `duration` - Duration of the reconcile before failure
pub fn record_reconciliation_error(stage: Stage, cancelled: bool, duration: Duration) {
    let status = if cancelled { "cancelled" } else { "error" };
    RECONCILIATIONS_TOTAL.with_label_values(&[status]).inc();
    STAGE_ERRORS_TOTAL
        .with_label_values(&[stage.as_str()])
        .inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a mutating provider call
pub fn record_provider_mutation(operation: &str) {
    PROVIDER_MUTATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
