// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # alb-targetgroup - Target Group Reconciliation for Kubernetes Ingresses
//!
//! Converges one cloud load-balancer target group per (ingress, backend) pair:
//! the target group exists, its health checks match the annotations, and its
//! tags, attributes and registered targets are exactly what the cluster implies.
//!
//! ## Overview
//!
//! Each reconcile call runs the same stages in order and fails fast:
//!
//! - Resolve the desired spec from ingress and service annotations
//! - Derive the target group name from identifying attributes
//! - Find the target group by name, create it, or modify drifted health checks
//! - Converge tags, then attributes, then targets
//!
//! Every stage is a no-op once converged, so repeating a call is safe and a
//! failed call is retried by simply running it again.
//!
//! ## Modules
//!
//! - [`reconcilers`] - The reconciliation engine and its facet reconcilers
//! - [`directory`] - Provider capability for target group lookup and mutation
//! - [`resolver`] / [`annotations`] - Desired-state resolution from annotations
//! - [`endpoints`] - Backend-to-target resolution from cluster state
//! - [`naming`] - Deterministic names and ownership tags
//! - [`context`] - Reflector stores shared by the resolvers
//! - [`config`] - Controller configuration
//! - [`plan`] - Offline planning from manifests
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use alb_targetgroup::naming::{NameTagGenerator, NamingStrategy};
//! use alb_targetgroup::types::{BackendRef, IngressRef, Protocol, ServicePort, TargetType};
//!
//! let naming = NameTagGenerator::new("prod", "cluster-a");
//! let name = naming.name_for(
//!     &IngressRef::new("default", "web"),
//!     &BackendRef::new("api", ServicePort::Number(80)),
//!     TargetType::Ip,
//!     Protocol::Http,
//! );
//! assert!(name.starts_with("prod-"));
//! ```

pub mod annotations;
pub mod config;
pub mod constants;
pub mod context;
pub mod directory;
pub mod endpoints;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod naming;
pub mod plan;
pub mod reconcilers;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod test_fixtures;
