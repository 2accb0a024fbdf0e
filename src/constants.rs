// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for target group convergence.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Provider Constants
// ============================================================================

/// Port sent when creating a target group.
///
/// Every registration carries its own explicit port, because one target group may
/// aggregate endpoints whose named target port resolves to different numbers. The
/// create API still requires a valid port, so a fixed placeholder is used.
pub const TARGET_GROUP_PLACEHOLDER_PORT: i64 = 1;

/// Maximum length of a target group name accepted by the provider
pub const MAX_TARGET_GROUP_NAME_LEN: usize = 32;

/// Maximum number of prefix characters kept in a generated target group name
pub const NAME_PREFIX_MAX_LEN: usize = 12;

/// Number of hex digest characters kept in a generated target group name
pub const NAME_HASH_LEN: usize = 19;

/// Target health state of targets that are being deregistered
pub const TARGET_STATE_DRAINING: &str = "draining";

// ============================================================================
// Annotation Defaults
// ============================================================================

/// Default annotation prefix
pub const DEFAULT_ANNOTATION_PREFIX: &str = "alb.ingress.kubernetes.io";

/// Default health check path
pub const DEFAULT_HEALTHCHECK_PATH: &str = "/";

/// Health check port value meaning "the port each target is registered on"
pub const HEALTHCHECK_PORT_TRAFFIC_PORT: &str = "traffic-port";

/// Default health check interval (15 seconds)
pub const DEFAULT_HEALTHCHECK_INTERVAL_SECS: i64 = 15;

/// Default health check timeout (5 seconds)
pub const DEFAULT_HEALTHCHECK_TIMEOUT_SECS: i64 = 5;

/// Default consecutive successes before a target is healthy
pub const DEFAULT_HEALTHY_THRESHOLD_COUNT: i64 = 2;

/// Default consecutive failures before a target is unhealthy
pub const DEFAULT_UNHEALTHY_THRESHOLD_COUNT: i64 = 2;

/// Default HTTP success-code matcher
pub const DEFAULT_SUCCESS_CODES: &str = "200";

// ============================================================================
// Health Check Limits
// ============================================================================

pub const MIN_HEALTHCHECK_INTERVAL_SECS: i64 = 5;
pub const MAX_HEALTHCHECK_INTERVAL_SECS: i64 = 300;
pub const MIN_HEALTHCHECK_TIMEOUT_SECS: i64 = 2;
pub const MAX_HEALTHCHECK_TIMEOUT_SECS: i64 = 120;
pub const MIN_THRESHOLD_COUNT: i64 = 2;
pub const MAX_THRESHOLD_COUNT: i64 = 10;

// ============================================================================
// Target Group Attribute Defaults
// ============================================================================

/// Provider defaults for target group attributes.
///
/// Always part of the desired bag, so removing an annotation reverts the attribute.
pub const DEFAULT_TARGET_GROUP_ATTRIBUTES: &[(&str, &str)] = &[
    ("deregistration_delay.timeout_seconds", "300"),
    ("slow_start.duration_seconds", "0"),
    ("stickiness.enabled", "false"),
    ("stickiness.type", "lb_cookie"),
    ("stickiness.lb_cookie.duration_seconds", "86400"),
];

// ============================================================================
// Environment Variables
// ============================================================================

/// Cluster name used in ownership tags
pub const ENV_CLUSTER_NAME: &str = "ALB_CLUSTER_NAME";

/// Prefix for generated target group names
pub const ENV_NAME_PREFIX: &str = "ALB_NAME_PREFIX";

/// VPC in which target groups are created
pub const ENV_VPC_ID: &str = "ALB_VPC_ID";

/// Annotation prefix override
pub const ENV_ANNOTATION_PREFIX: &str = "ALB_ANNOTATION_PREFIX";
