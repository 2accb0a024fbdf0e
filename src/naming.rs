// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deterministic target group naming and ownership tags.
//!
//! The generated name is the only identity a target group has: reconciles find
//! their target group again by recomputing it. Two properties follow:
//!
//! - identical inputs always produce the identical name
//! - distinct (namespace, ingress, service, port, protocol, target type) tuples
//!   produce distinct names, otherwise unrelated backends would share one target group
//!
//! # Example
//!
//! ```rust
//! use alb_targetgroup::naming::{NameTagGenerator, NamingStrategy};
//! use alb_targetgroup::types::{BackendRef, IngressRef, Protocol, ServicePort, TargetType};
//!
//! let naming = NameTagGenerator::new("prod", "prod");
//! let ingress = IngressRef::new("shop", "web");
//! let backend = BackendRef::new("cart", ServicePort::Name("http".into()));
//!
//! let name = naming.name_for(&ingress, &backend, TargetType::Ip, Protocol::Http);
//! assert!(name.starts_with("prod-"));
//! assert!(name.len() <= 32);
//! ```

use crate::constants::{MAX_TARGET_GROUP_NAME_LEN, NAME_HASH_LEN, NAME_PREFIX_MAX_LEN};
use crate::labels::{
    TAG_CLUSTER_OWNED, TAG_CLUSTER_PREFIX, TAG_INGRESS_NAME, TAG_NAMESPACE, TAG_SERVICE_NAME,
    TAG_SERVICE_PORT,
};
use crate::types::{BackendRef, IngressRef, Protocol, TagSet, TargetType};
use sha2::{Digest, Sha256};

#[cfg(test)]
use mockall::automock;

/// Fallback prefix when the configured one has no usable characters
const FALLBACK_NAME_PREFIX: &str = "k8s";

/// Derives target group names and tag sets from identifying attributes.
///
/// Implementations must be pure: no I/O, same output for the same input.
#[cfg_attr(test, automock)]
pub trait NamingStrategy: Send + Sync {
    /// Name of the target group serving `backend` of `ingress`.
    fn name_for(
        &self,
        ingress: &IngressRef,
        backend: &BackendRef,
        target_type: TargetType,
        protocol: Protocol,
    ) -> String;

    /// Tags identifying the owning ingress.
    fn group_tags(&self, ingress: &IngressRef) -> TagSet;

    /// Tags identifying the owning backend.
    fn resource_tags(&self, backend: &BackendRef) -> TagSet;
}

/// Default [`NamingStrategy`]: prefixed SHA-256 names and `kubernetes.io/*` tags.
#[derive(Clone, Debug)]
pub struct NameTagGenerator {
    name_prefix: String,
    cluster_name: String,
}

impl NameTagGenerator {
    #[must_use]
    pub fn new(name_prefix: impl Into<String>, cluster_name: impl Into<String>) -> Self {
        Self {
            name_prefix: sanitize_prefix(&name_prefix.into()),
            cluster_name: cluster_name.into(),
        }
    }

    /// The sanitized prefix used in generated names.
    #[must_use]
    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }
}

impl NamingStrategy for NameTagGenerator {
    fn name_for(
        &self,
        ingress: &IngressRef,
        backend: &BackendRef,
        target_type: TargetType,
        protocol: Protocol,
    ) -> String {
        let service_port = backend.service_port.to_string();
        let fields = [
            ingress.namespace.as_str(),
            ingress.name.as_str(),
            backend.service_name.as_str(),
            service_port.as_str(),
            protocol.as_str(),
            target_type.as_str(),
        ];

        // NUL-terminate every field so ("ab", "c") and ("a", "bc") hash differently
        let mut hasher = Sha256::new();
        for field in fields {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        let digest = format!("{:x}", hasher.finalize());
        let hash = digest.get(..NAME_HASH_LEN).unwrap_or(&digest);

        let name = format!("{}-{hash}", self.name_prefix);
        debug_assert!(name.len() <= MAX_TARGET_GROUP_NAME_LEN);
        name
    }

    fn group_tags(&self, ingress: &IngressRef) -> TagSet {
        [
            (
                format!("{TAG_CLUSTER_PREFIX}{}", self.cluster_name),
                TAG_CLUSTER_OWNED.to_string(),
            ),
            (TAG_NAMESPACE.to_string(), ingress.namespace.clone()),
            (TAG_INGRESS_NAME.to_string(), ingress.name.clone()),
        ]
        .into_iter()
        .collect()
    }

    fn resource_tags(&self, backend: &BackendRef) -> TagSet {
        [
            (TAG_SERVICE_NAME.to_string(), backend.service_name.clone()),
            (TAG_SERVICE_PORT.to_string(), backend.service_port.to_string()),
        ]
        .into_iter()
        .collect()
    }
}

/// Replace non-alphanumerics with `-`, truncate, and strip edge hyphens.
fn sanitize_prefix(prefix: &str) -> String {
    let sanitized: String = prefix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .take(NAME_PREFIX_MAX_LEN)
        .collect();
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_NAME_PREFIX.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;
