// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Offline planning from Kubernetes manifests.
//!
//! Resolves what every backend of every ingress in a manifest bundle would
//! converge to (name, desired spec, tags) without contacting a cluster or the
//! provider. Only annotations are read, so endpoints are not part of a plan.

use crate::context::Stores;
use crate::errors::ConfigError;
use crate::naming::NamingStrategy;
use crate::reconcilers::merge_tags;
use crate::resolver::{AnnotationResolver, DesiredStateResolver};
use crate::types::{BackendRef, DesiredSpec, IngressRef, TagSet};
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Namespace assumed for manifests that do not set one
const DEFAULT_NAMESPACE: &str = "default";

/// What one ingress backend would converge to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPlan {
    pub ingress: IngressRef,
    pub backend: BackendRef,
    pub name: String,
    pub spec: DesiredSpec,
    pub tags: TagSet,
}

/// Plan every ingress backend found in a multi-document YAML (or JSON) bundle.
///
/// Documents other than `Ingress` and `Service` are skipped.
///
/// # Errors
///
/// Returns an error if a document cannot be parsed or a backend cannot be resolved.
pub fn plan_manifests(
    document: &str,
    naming: &dyn NamingStrategy,
    annotation_prefix: &str,
) -> Result<Vec<BackendPlan>> {
    let (ingresses, services) = parse_manifests(document)?;
    let refs: Vec<(IngressRef, Vec<BackendRef>)> = ingresses
        .iter()
        .map(|ingress| {
            let ingress_ref = IngressRef::new(
                ingress.metadata.namespace.clone().unwrap_or_default(),
                ingress.metadata.name.clone().unwrap_or_default(),
            );
            let backends = ingress_backends(ingress)
                .with_context(|| format!("Invalid backend in ingress {ingress_ref}"))?;
            Ok((ingress_ref, backends))
        })
        .collect::<Result<_>>()?;

    let resolver = AnnotationResolver::new(
        Stores::from_objects(ingresses, services, Vec::new(), Vec::new()),
        annotation_prefix,
    );

    let mut plans = Vec::new();
    for (ingress, backends) in refs {
        for backend in backends {
            let spec = resolver
                .resolve(&ingress, &backend.service_name)
                .with_context(|| format!("Failed to resolve {backend} of ingress {ingress}"))?;
            let name = naming.name_for(&ingress, &backend, spec.target_type, spec.backend_protocol);
            let tags = merge_tags(naming.group_tags(&ingress), &naming.resource_tags(&backend));
            plans.push(BackendPlan {
                ingress: ingress.clone(),
                backend,
                name,
                spec,
                tags,
            });
        }
    }
    Ok(plans)
}

/// Distinct service backends of `ingress`, default backend first, in rule order.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedBackend`] for resource backends or backends without a port.
pub fn ingress_backends(ingress: &Ingress) -> Result<Vec<BackendRef>, ConfigError> {
    let Some(spec) = ingress.spec.as_ref() else {
        return Ok(Vec::new());
    };

    let rule_backends = spec
        .rules
        .iter()
        .flatten()
        .filter_map(|rule| rule.http.as_ref())
        .flat_map(|http| http.paths.iter().map(|path| &path.backend));

    let mut backends: Vec<BackendRef> = Vec::new();
    for backend in spec.default_backend.iter().chain(rule_backends) {
        let backend = BackendRef::try_from(backend)?;
        if !backends.contains(&backend) {
            backends.push(backend);
        }
    }
    Ok(backends)
}

fn parse_manifests(document: &str) -> Result<(Vec<Ingress>, Vec<Service>)> {
    let mut ingresses = Vec::new();
    let mut services = Vec::new();

    for (index, part) in serde_yaml::Deserializer::from_str(document).enumerate() {
        let value = serde_yaml::Value::deserialize(part)
            .with_context(|| format!("Failed to parse manifest document {index}"))?;
        if value.is_null() {
            continue;
        }

        let kind = value
            .get("kind")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default()
            .to_string();
        match kind.as_str() {
            "Ingress" => {
                let mut ingress: Ingress = serde_yaml::from_value(value)
                    .with_context(|| format!("Failed to parse Ingress in document {index}"))?;
                ingress
                    .metadata
                    .namespace
                    .get_or_insert_with(|| DEFAULT_NAMESPACE.to_string());
                ingresses.push(ingress);
            }
            "Service" => {
                let mut service: Service = serde_yaml::from_value(value)
                    .with_context(|| format!("Failed to parse Service in document {index}"))?;
                service
                    .metadata
                    .namespace
                    .get_or_insert_with(|| DEFAULT_NAMESPACE.to_string());
                services.push(service);
            }
            other => debug!(kind = %other, document = index, "Skipping manifest"),
        }
    }

    debug!(
        ingresses = ingresses.len(),
        services = services.len(),
        "Parsed manifests"
    );
    Ok((ingresses, services))
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod plan_tests;
