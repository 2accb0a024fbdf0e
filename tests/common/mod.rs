// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests: an in-memory provider and
//! builders for the Kubernetes objects the resolvers read.

#![allow(dead_code)]

use alb_targetgroup::directory::TargetGroupDirectory;
use alb_targetgroup::errors::ProviderError;
use alb_targetgroup::reconcilers::{AttributeApi, RegisteredTarget, TagApi, TargetApi};
use alb_targetgroup::types::{
    Attributes, CreateTargetGroupRequest, ModifyTargetGroupRequest, TagSet, Target, TargetGroup,
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Endpoints, Node, Service};
use k8s_openapi::api::networking::v1::Ingress;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Attributes every new target group starts with, including one no annotation manages
const PROVIDER_DEFAULT_ATTRIBUTES: &[(&str, &str)] = &[
    ("deregistration_delay.timeout_seconds", "300"),
    ("slow_start.duration_seconds", "0"),
    ("stickiness.enabled", "false"),
    ("stickiness.type", "lb_cookie"),
    ("stickiness.lb_cookie.duration_seconds", "86400"),
    ("load_balancing.algorithm.type", "round_robin"),
];

#[derive(Default)]
struct ProviderState {
    groups: BTreeMap<String, TargetGroup>,
    tags: HashMap<String, TagSet>,
    attributes: HashMap<String, Attributes>,
    registrations: HashMap<String, Vec<RegisteredTarget>>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, ProviderError>,
    next_id: usize,
}

impl ProviderState {
    fn record(&mut self, operation: &'static str) -> Result<(), ProviderError> {
        *self.calls.entry(operation).or_default() += 1;
        match self.failures.remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// In-memory target group provider.
///
/// Deregistered targets move to `draining` rather than disappearing, as they do
/// on the real provider.
#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<ProviderState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: ProviderError) {
        self.state.lock().unwrap().failures.insert(operation, error);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Calls that change provider state.
    pub fn mutation_count(&self) -> usize {
        [
            "create",
            "modify",
            "add_tags",
            "remove_tags",
            "modify_attributes",
            "register_targets",
            "deregister_targets",
        ]
        .iter()
        .map(|operation| self.calls(operation))
        .sum()
    }

    pub fn group(&self, name: &str) -> Option<TargetGroup> {
        self.state.lock().unwrap().groups.get(name).cloned()
    }

    pub fn group_count(&self) -> usize {
        self.state.lock().unwrap().groups.len()
    }

    pub fn tags_of(&self, arn: &str) -> TagSet {
        self.state
            .lock()
            .unwrap()
            .tags
            .get(arn)
            .cloned()
            .unwrap_or_default()
    }

    pub fn attributes_of(&self, arn: &str) -> Attributes {
        self.state
            .lock()
            .unwrap()
            .attributes
            .get(arn)
            .cloned()
            .unwrap_or_default()
    }

    /// Registered targets not draining, sorted.
    pub fn active_targets(&self, arn: &str) -> Vec<Target> {
        let mut targets: Vec<Target> = self
            .state
            .lock()
            .unwrap()
            .registrations
            .get(arn)
            .into_iter()
            .flatten()
            .filter(|registration| !registration.is_draining())
            .map(|registration| registration.target.clone())
            .collect();
        targets.sort();
        targets
    }

    fn ensure_known(state: &ProviderState, arn: &str) -> Result<(), ProviderError> {
        if state.groups.values().any(|group| group.arn == arn) {
            Ok(())
        } else {
            Err(ProviderError::Api {
                operation: "lookup".to_string(),
                code: "TargetGroupNotFound".to_string(),
                message: format!("target group {arn} not found"),
            })
        }
    }
}

#[async_trait]
impl TargetGroupDirectory for FakeProvider {
    async fn find_by_name(&self, name: &str) -> Result<Option<TargetGroup>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("find_by_name")?;
        Ok(state.groups.get(name).cloned())
    }

    async fn create(
        &self,
        request: CreateTargetGroupRequest,
    ) -> Result<TargetGroup, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("create")?;
        if state.groups.contains_key(&request.name) {
            return Err(ProviderError::AlreadyExists { name: request.name });
        }

        state.next_id += 1;
        let arn = format!(
            "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/{}/{:016x}",
            request.name, state.next_id
        );
        let group = TargetGroup {
            arn: arn.clone(),
            name: request.name.clone(),
            target_type: request.target_type,
            protocol: request.protocol,
            port: request.port,
            vpc_id: request.vpc_id,
            health_check: request.health_check,
        };
        state.groups.insert(request.name, group.clone());
        state.attributes.insert(
            arn,
            PROVIDER_DEFAULT_ATTRIBUTES
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        Ok(group)
    }

    async fn modify(
        &self,
        request: ModifyTargetGroupRequest,
    ) -> Result<TargetGroup, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("modify")?;
        let group = state
            .groups
            .values_mut()
            .find(|group| group.arn == request.arn)
            .ok_or_else(|| ProviderError::Api {
                operation: "modify".to_string(),
                code: "TargetGroupNotFound".to_string(),
                message: format!("target group {} not found", request.arn),
            })?;
        group.health_check = request.health_check;
        Ok(group.clone())
    }
}

#[async_trait]
impl TagApi for FakeProvider {
    async fn describe_tags(&self, arn: &str) -> Result<TagSet, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("describe_tags")?;
        Self::ensure_known(&state, arn)?;
        Ok(state.tags.get(arn).cloned().unwrap_or_default())
    }

    async fn add_tags(&self, arn: &str, tags: &TagSet) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("add_tags")?;
        Self::ensure_known(&state, arn)?;
        state.tags.entry(arn.to_string()).or_default().merge(tags);
        Ok(())
    }

    async fn remove_tags(&self, arn: &str, keys: &[String]) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("remove_tags")?;
        Self::ensure_known(&state, arn)?;
        let current = state.tags.get(arn).cloned().unwrap_or_default();
        let kept: TagSet = current
            .iter()
            .filter(|(key, _)| !keys.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        state.tags.insert(arn.to_string(), kept);
        Ok(())
    }
}

#[async_trait]
impl AttributeApi for FakeProvider {
    async fn describe_attributes(&self, arn: &str) -> Result<Attributes, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("describe_attributes")?;
        Self::ensure_known(&state, arn)?;
        Ok(state.attributes.get(arn).cloned().unwrap_or_default())
    }

    async fn modify_attributes(
        &self,
        arn: &str,
        changes: &Attributes,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("modify_attributes")?;
        Self::ensure_known(&state, arn)?;
        state
            .attributes
            .entry(arn.to_string())
            .or_default()
            .extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

#[async_trait]
impl TargetApi for FakeProvider {
    async fn describe_targets(&self, arn: &str) -> Result<Vec<RegisteredTarget>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("describe_targets")?;
        Self::ensure_known(&state, arn)?;
        Ok(state.registrations.get(arn).cloned().unwrap_or_default())
    }

    async fn register_targets(&self, arn: &str, targets: &[Target]) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("register_targets")?;
        Self::ensure_known(&state, arn)?;
        let registrations = state.registrations.entry(arn.to_string()).or_default();
        registrations.retain(|registration| !targets.contains(&registration.target));
        registrations.extend(
            targets
                .iter()
                .map(|target| RegisteredTarget::new(target.clone(), "initial")),
        );
        Ok(())
    }

    async fn deregister_targets(
        &self,
        arn: &str,
        targets: &[Target],
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record("deregister_targets")?;
        Self::ensure_known(&state, arn)?;
        for registration in state.registrations.entry(arn.to_string()).or_default() {
            if targets.contains(&registration.target) {
                registration.state = "draining".to_string();
            }
        }
        Ok(())
    }
}

// ============================================================================
// Kubernetes object builders
// ============================================================================

pub fn ingress(namespace: &str, name: &str, annotations: serde_json::Value) -> Ingress {
    serde_json::from_value(json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "annotations": annotations
        }
    }))
    .unwrap()
}

/// Service with one named port `http` on 80 targeting 8080, exposed on `node_port`.
pub fn service(
    namespace: &str,
    name: &str,
    annotations: serde_json::Value,
    node_port: i32,
) -> Service {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "annotations": annotations
        },
        "spec": {
            "type": "NodePort",
            "ports": [{ "name": "http", "port": 80, "targetPort": 8080, "nodePort": node_port }]
        }
    }))
    .unwrap()
}

/// Endpoints with `ready` pod IPs on port `http`/8080.
pub fn endpoints(namespace: &str, name: &str, ready: &[&str]) -> Endpoints {
    let addresses: Vec<serde_json::Value> = ready.iter().map(|ip| json!({ "ip": ip })).collect();
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Endpoints",
        "metadata": { "name": name, "namespace": namespace },
        "subsets": [{
            "addresses": addresses,
            "ports": [{ "name": "http", "port": 8080, "protocol": "TCP" }]
        }]
    }))
    .unwrap()
}

pub fn node(name: &str, instance_id: &str, ready: bool) -> Node {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Node",
        "metadata": { "name": name },
        "spec": { "providerID": format!("aws:///us-east-1a/{instance_id}") },
        "status": {
            "conditions": [{ "type": "Ready", "status": if ready { "True" } else { "False" } }]
        }
    }))
    .unwrap()
}
