// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for target group convergence.
//!
//! This module provides specialized error types for:
//! - Provider API failures (lookup, create, modify)
//! - Desired-state resolution failures (missing objects, malformed annotations)
//! - Stage-classified reconciliation failures returned to the control loop
//!
//! Every [`ReconcileError`] names the stage that failed so the caller can tell a
//! creation conflict from a modify rejection or a facet failure without parsing
//! error strings.

use std::fmt;
use thiserror::Error;

/// Errors returned by the load-balancer provider API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// A target group with the same name already exists.
    ///
    /// Usually means a concurrent reconcile won the create race.
    #[error("target group '{name}' already exists")]
    AlreadyExists {
        /// Name that collided
        name: String,
    },

    /// Account quota for target groups (or targets) exhausted
    #[error("quota exceeded: {reason}")]
    QuotaExceeded {
        /// Provider message
        reason: String,
    },

    /// Request rejected because of an invalid field or field combination
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Provider message
        reason: String,
    },

    /// Request rate-limited by the provider
    #[error("request throttled during {operation}")]
    Throttled {
        /// API operation that was throttled
        operation: String,
    },

    /// Any other provider error
    #[error("{operation} failed with {code}: {message}")]
    Api {
        /// API operation that failed
        operation: String,
        /// Provider error code
        code: String,
        /// Provider message
        message: String,
    },

    /// Provider returned a target group without an identifier
    #[error("provider returned target group '{name}' without an ARN")]
    MissingArn {
        /// Name of the returned target group
        name: String,
    },
}

impl ProviderError {
    /// Whether the error reports a name collision on create.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Errors resolving the desired specification from ingress and service objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The owning ingress is not in the store
    #[error("ingress '{key}' not found")]
    IngressNotFound {
        /// `namespace/name` key
        key: String,
    },

    /// The backend service is not in the store
    #[error("service '{key}' not found")]
    ServiceNotFound {
        /// `namespace/name` key
        key: String,
    },

    /// An annotation value could not be parsed or is out of range
    #[error("invalid annotation {key}='{value}': {reason}")]
    InvalidAnnotation {
        /// Fully-qualified annotation key
        key: String,
        /// Raw annotation value
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Individually valid health-check values that are inconsistent together
    #[error("invalid health check: {reason}")]
    InvalidHealthCheck {
        /// Why the combination was rejected
        reason: String,
    },

    /// The backend reference cannot be served by a target group
    #[error("unsupported backend: {reason}")]
    UnsupportedBackend {
        /// Why the backend was rejected
        reason: String,
    },
}

/// Reconciliation stage, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Configuration,
    Lookup,
    Creation,
    Modification,
    Tags,
    Attributes,
    Targets,
}

impl Stage {
    /// Label value used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Lookup => "lookup",
            Self::Creation => "creation",
            Self::Modification => "modification",
            Self::Tags => "tags",
            Self::Attributes => "attributes",
            Self::Targets => "targets",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed reconcile, classified by the stage that failed.
///
/// No partial result accompanies these errors; the control loop re-queues the
/// whole (ingress, backend) pair.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("failed to load service annotations due to {0}")]
    Configuration(#[source] ConfigError),

    #[error("failed to find existing target group due to {0}")]
    Lookup(#[source] ProviderError),

    #[error("failed to create target group due to {0}")]
    Creation(#[source] ProviderError),

    #[error("failed to modify target group due to {0}")]
    Modification(#[source] ProviderError),

    #[error("failed to reconcile target group tags due to {0:#}")]
    Tags(#[source] anyhow::Error),

    #[error("failed to reconcile target group attributes due to {0:#}")]
    Attributes(#[source] anyhow::Error),

    #[error("failed to reconcile target group targets due to {0:#}")]
    Targets(#[source] anyhow::Error),

    #[error("reconcile cancelled during {stage} stage")]
    Cancelled {
        /// Stage whose in-flight call was abandoned
        stage: Stage,
    },
}

impl ReconcileError {
    /// The stage that produced this error.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Configuration(_) => Stage::Configuration,
            Self::Lookup(_) => Stage::Lookup,
            Self::Creation(_) => Stage::Creation,
            Self::Modification(_) => Stage::Modification,
            Self::Tags(_) => Stage::Tags,
            Self::Attributes(_) => Stage::Attributes,
            Self::Targets(_) => Stage::Targets,
            Self::Cancelled { stage } => *stage,
        }
    }

    /// Whether the reconcile was abandoned because the caller cancelled it.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
