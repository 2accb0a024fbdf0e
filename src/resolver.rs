// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state resolution for one ingress backend.

use crate::annotations::{merge_annotations, parse_desired_spec};
use crate::context::{namespaced_key, Stores};
use crate::errors::ConfigError;
use crate::types::{DesiredSpec, IngressRef};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Produces the [`DesiredSpec`] for a backend service of an ingress.
#[cfg_attr(test, automock)]
pub trait DesiredStateResolver: Send + Sync {
    /// Resolve the spec for `service_name` as routed by `ingress`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the ingress or service is unknown or an
    /// annotation is malformed.
    fn resolve(&self, ingress: &IngressRef, service_name: &str)
        -> Result<DesiredSpec, ConfigError>;
}

/// [`DesiredStateResolver`] backed by ingress and service annotations in reflector stores.
#[derive(Clone)]
pub struct AnnotationResolver {
    stores: Stores,
    annotation_prefix: String,
}

impl AnnotationResolver {
    #[must_use]
    pub fn new(stores: Stores, annotation_prefix: impl Into<String>) -> Self {
        Self {
            stores,
            annotation_prefix: annotation_prefix.into(),
        }
    }
}

impl DesiredStateResolver for AnnotationResolver {
    fn resolve(
        &self,
        ingress: &IngressRef,
        service_name: &str,
    ) -> Result<DesiredSpec, ConfigError> {
        let ingress_obj = self
            .stores
            .ingress(&ingress.namespace, &ingress.name)
            .ok_or_else(|| ConfigError::IngressNotFound {
                key: namespaced_key(&ingress.namespace, &ingress.name),
            })?;
        let service_obj = self
            .stores
            .service(&ingress.namespace, service_name)
            .ok_or_else(|| ConfigError::ServiceNotFound {
                key: namespaced_key(&ingress.namespace, service_name),
            })?;

        let merged = merge_annotations(
            ingress_obj.metadata.annotations.as_ref(),
            service_obj.metadata.annotations.as_ref(),
        );
        let spec = parse_desired_spec(&merged, &self.annotation_prefix)?;

        debug!(
            ingress = %ingress,
            service = %service_name,
            target_type = %spec.target_type,
            protocol = %spec.backend_protocol,
            "Resolved desired target group spec"
        );
        Ok(spec)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
