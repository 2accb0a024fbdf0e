// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Drift detection between a live target group and its desired spec.
//!
//! This runs on every reconcile of every backend, so a converged target group
//! must compare equal and produce no modify call.
//!
//! Equality is over optional values: both absent, or both present and equal. An
//! absent value is never coerced to a default before comparing.

use crate::types::{DesiredSpec, TargetGroup};
use tracing::debug;

/// Whether any tracked health-check or matcher field differs.
///
/// Tracked fields: health-check path, port, protocol, interval and timeout; the
/// success-code matcher; healthy and unhealthy threshold counts. Target type and
/// protocol are immutable after creation and are not compared.
#[must_use]
pub fn needs_modification(instance: &TargetGroup, spec: &DesiredSpec) -> bool {
    let live = &instance.health_check;
    let desired = &spec.health_check;

    let drifted: Vec<&str> = [
        ("healthCheckPath", live.path != desired.path),
        ("healthCheckPort", live.port != desired.port),
        ("healthCheckProtocol", live.protocol != desired.protocol),
        (
            "healthCheckIntervalSeconds",
            live.interval_seconds != desired.interval_seconds,
        ),
        (
            "healthCheckTimeoutSeconds",
            live.timeout_seconds != desired.timeout_seconds,
        ),
        ("matcher", live.success_codes != desired.success_codes),
        (
            "healthyThresholdCount",
            live.healthy_threshold_count != desired.healthy_threshold_count,
        ),
        (
            "unhealthyThresholdCount",
            live.unhealthy_threshold_count != desired.unhealthy_threshold_count,
        ),
    ]
    .into_iter()
    .filter_map(|(field, differs)| differs.then_some(field))
    .collect();

    if drifted.is_empty() {
        return false;
    }

    debug!(
        target_group = %instance.name,
        fields = ?drifted,
        "Target group health check drifted from desired spec"
    );
    true
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod drift_tests;
