// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resolution of ingress backends into concrete registrable targets.
//!
//! # Target Types
//!
//! - **ip**: one target per ready pod address, on the endpoint port backing the
//!   service port
//! - **instance**: one target per ready node, on the service port's node port
//!
//! Ports are resolved per endpoint, so a named target port that maps to
//! different container ports across pods yields targets with different ports.

use crate::context::{namespaced_key, Stores};
use crate::types::{BackendRef, IngressRef, ServicePort, Target, TargetType};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ServicePort as KubeServicePort;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Resolves a backend reference into the targets to register.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Concrete targets for `backend` of `ingress`, registered as `target_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service, its port, or its endpoints cannot be resolved.
    async fn resolve(
        &self,
        ingress: &IngressRef,
        backend: &BackendRef,
        target_type: TargetType,
    ) -> Result<Vec<Target>>;
}

/// [`EndpointResolver`] backed by service, endpoints and node reflector stores.
#[derive(Clone)]
pub struct StoreEndpointResolver {
    stores: Stores,
}

impl StoreEndpointResolver {
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    fn resolve_ip(
        &self,
        namespace: &str,
        service_name: &str,
        service_port: &KubeServicePort,
    ) -> Result<Vec<Target>> {
        let endpoints = self
            .stores
            .endpoints(namespace, service_name)
            .ok_or_else(|| {
                anyhow!(
                    "endpoints for service '{}' not found",
                    namespaced_key(namespace, service_name)
                )
            })?;

        let wanted_name = service_port.name.as_deref().unwrap_or_default();
        let mut targets = Vec::new();
        for subset in endpoints.subsets.iter().flatten() {
            for endpoint_port in subset.ports.iter().flatten() {
                // An unnamed service port is only legal when it is the only port
                if !wanted_name.is_empty()
                    && endpoint_port.name.as_deref().unwrap_or_default() != wanted_name
                {
                    continue;
                }
                for address in subset.addresses.iter().flatten() {
                    targets.push(Target::new(address.ip.clone(), endpoint_port.port));
                }
            }
        }
        Ok(targets)
    }

    fn resolve_instance(
        &self,
        namespace: &str,
        service_name: &str,
        service_port: &KubeServicePort,
    ) -> Result<Vec<Target>> {
        let node_port = service_port.node_port.ok_or_else(|| {
            anyhow!(
                "service '{}' port {} has no nodePort, instance targets require a NodePort or LoadBalancer service",
                namespaced_key(namespace, service_name),
                service_port.port
            )
        })?;

        Ok(self
            .stores
            .ready_nodes()
            .iter()
            .filter_map(|node| {
                node.spec
                    .as_ref()
                    .and_then(|spec| spec.provider_id.as_deref())
                    .and_then(instance_id_from_provider_id)
            })
            .map(|instance_id| Target::new(instance_id, node_port))
            .collect())
    }
}

#[async_trait]
impl EndpointResolver for StoreEndpointResolver {
    async fn resolve(
        &self,
        ingress: &IngressRef,
        backend: &BackendRef,
        target_type: TargetType,
    ) -> Result<Vec<Target>> {
        let namespace = ingress.namespace.as_str();
        let service = self
            .stores
            .service(namespace, &backend.service_name)
            .ok_or_else(|| {
                anyhow!(
                    "service '{}' not found",
                    namespaced_key(namespace, &backend.service_name)
                )
            })?;

        let service_port = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .and_then(|ports| ports.iter().find(|p| port_matches(p, &backend.service_port)))
            .ok_or_else(|| {
                anyhow!(
                    "service '{}' has no port {}",
                    namespaced_key(namespace, &backend.service_name),
                    backend.service_port
                )
            })?;

        let mut targets = match target_type {
            TargetType::Ip => self.resolve_ip(namespace, &backend.service_name, service_port)?,
            TargetType::Instance => {
                self.resolve_instance(namespace, &backend.service_name, service_port)?
            }
        };
        targets.sort();
        targets.dedup();

        debug!(
            ingress = %ingress,
            backend = %backend,
            target_type = %target_type,
            count = targets.len(),
            "Resolved backend endpoints"
        );
        Ok(targets)
    }
}

fn port_matches(port: &KubeServicePort, wanted: &ServicePort) -> bool {
    match wanted {
        ServicePort::Number(number) => port.port == *number,
        ServicePort::Name(name) => port.name.as_deref() == Some(name.as_str()),
    }
}

/// Extract `i-...` from a provider id such as `aws:///us-west-2a/i-0abc123`.
fn instance_id_from_provider_id(provider_id: &str) -> Option<String> {
    provider_id
        .rsplit('/')
        .next()
        .filter(|id| id.starts_with("i-"))
        .map(str::to_string)
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod endpoints_tests;
