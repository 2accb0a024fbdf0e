// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tag keys and annotation names used across the crate.
//!
//! Tag keys identify which ingress and backend own a target group. Annotation
//! names are suffixes joined to the configured prefix (by default
//! `alb.ingress.kubernetes.io`).

// ============================================================================
// Ownership Tags
// ============================================================================

/// Prefix of the cluster ownership tag; the cluster name is appended
pub const TAG_CLUSTER_PREFIX: &str = "kubernetes.io/cluster/";

/// Value of the cluster ownership tag
pub const TAG_CLUSTER_OWNED: &str = "owned";

/// Namespace of the owning ingress
pub const TAG_NAMESPACE: &str = "kubernetes.io/namespace";

/// Name of the owning ingress
pub const TAG_INGRESS_NAME: &str = "kubernetes.io/ingress-name";

/// Backend service name
pub const TAG_SERVICE_NAME: &str = "kubernetes.io/service-name";

/// Backend service port (name or number)
pub const TAG_SERVICE_PORT: &str = "kubernetes.io/service-port";

// ============================================================================
// Annotation Suffixes
// ============================================================================

pub const ANNOTATION_TARGET_TYPE: &str = "target-type";
pub const ANNOTATION_BACKEND_PROTOCOL: &str = "backend-protocol";
pub const ANNOTATION_HEALTHCHECK_PATH: &str = "healthcheck-path";
pub const ANNOTATION_HEALTHCHECK_PORT: &str = "healthcheck-port";
pub const ANNOTATION_HEALTHCHECK_PROTOCOL: &str = "healthcheck-protocol";
pub const ANNOTATION_HEALTHCHECK_INTERVAL: &str = "healthcheck-interval-seconds";
pub const ANNOTATION_HEALTHCHECK_TIMEOUT: &str = "healthcheck-timeout-seconds";
pub const ANNOTATION_HEALTHY_THRESHOLD: &str = "healthy-threshold-count";
pub const ANNOTATION_UNHEALTHY_THRESHOLD: &str = "unhealthy-threshold-count";
pub const ANNOTATION_SUCCESS_CODES: &str = "success-codes";
pub const ANNOTATION_TARGET_GROUP_ATTRIBUTES: &str = "target-group-attributes";

/// Build a fully-qualified annotation key from a prefix and suffix.
///
/// ```rust
/// use alb_targetgroup::labels::{annotation_key, ANNOTATION_TARGET_TYPE};
///
/// assert_eq!(
///     annotation_key("alb.ingress.kubernetes.io", ANNOTATION_TARGET_TYPE),
///     "alb.ingress.kubernetes.io/target-type"
/// );
/// ```
#[must_use]
pub fn annotation_key(prefix: &str, suffix: &str) -> String {
    format!("{}/{suffix}", prefix.trim_end_matches('/'))
}
