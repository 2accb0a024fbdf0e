// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Core data types for target group convergence.
//!
//! These types describe both sides of a reconciliation:
//!
//! - **Desired state** - [`DesiredSpec`], resolved fresh from annotations on every call
//! - **Live state** - [`TargetGroup`], the provider's canonical representation
//! - **Facets** - [`TagSet`], attribute bags and [`TargetSet`], converged after the
//!   target group itself exists
//! - **Result** - [`TargetGroupView`], the read-only projection returned to callers
//!
//! Provider fields that may be absent are modelled as `Option` rather than
//! sentinel values so that "unset" and "set to the default" stay distinguishable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How targets are registered with a target group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Targets are registered by provider instance identifier (`i-...`) on a node port
    #[default]
    Instance,
    /// Targets are registered by pod IP address on the container port
    Ip,
}

impl TargetType {
    /// Wire representation used by the provider API and in annotations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Ip => "ip",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instance" => Ok(Self::Instance),
            "ip" => Ok(Self::Ip),
            other => Err(format!("unknown target type '{other}', expected 'instance' or 'ip'")),
        }
    }
}

/// Protocol used for traffic or health checks between the load balancer and targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    /// Wire representation used by the provider API and in annotations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP" => Ok(Self::Http),
            "HTTPS" => Ok(Self::Https),
            other => Err(format!("unknown protocol '{other}', expected 'HTTP' or 'HTTPS'")),
        }
    }
}

/// Identity of the ingress that owns a routing rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngressRef {
    pub namespace: String,
    pub name: String,
}

impl IngressRef {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for IngressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A service port as referenced from an ingress backend: either by name or by number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServicePort {
    Number(i32),
    Name(String),
}

impl fmt::Display for ServicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// One backend of an ingress routing rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRef {
    pub service_name: String,
    pub service_port: ServicePort,
}

impl BackendRef {
    #[must_use]
    pub fn new(service_name: impl Into<String>, service_port: ServicePort) -> Self {
        Self {
            service_name: service_name.into(),
            service_port,
        }
    }
}

impl fmt::Display for BackendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service_name, self.service_port)
    }
}

impl TryFrom<&k8s_openapi::api::networking::v1::IngressBackend> for BackendRef {
    type Error = crate::errors::ConfigError;

    fn try_from(
        backend: &k8s_openapi::api::networking::v1::IngressBackend,
    ) -> Result<Self, Self::Error> {
        let service = backend.service.as_ref().ok_or_else(|| {
            crate::errors::ConfigError::UnsupportedBackend {
                reason: "resource backends are not supported, a service backend is required"
                    .to_string(),
            }
        })?;
        let port = service.port.as_ref().ok_or_else(|| {
            crate::errors::ConfigError::UnsupportedBackend {
                reason: format!("backend service '{}' has no port", service.name),
            }
        })?;
        let service_port = match (&port.name, port.number) {
            (Some(name), _) if !name.is_empty() => ServicePort::Name(name.clone()),
            (_, Some(number)) => ServicePort::Number(number),
            _ => {
                return Err(crate::errors::ConfigError::UnsupportedBackend {
                    reason: format!(
                        "backend service '{}' port has neither name nor number",
                        service.name
                    ),
                })
            }
        };
        Ok(Self::new(service.name.clone(), service_port))
    }
}

/// Health-check and matcher fields tracked for drift.
///
/// The same shape is used for the desired spec and the live target group so the
/// diff policy compares like with like.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckSettings {
    pub path: Option<String>,
    /// Either `traffic-port` or a literal port number
    pub port: Option<String>,
    pub protocol: Option<Protocol>,
    pub interval_seconds: Option<i64>,
    pub timeout_seconds: Option<i64>,
    /// HTTP success-code matcher, e.g. `200` or `200-299`
    pub success_codes: Option<String>,
    pub healthy_threshold_count: Option<i64>,
    pub unhealthy_threshold_count: Option<i64>,
}

/// Provider-level attribute bag (`key` -> `value`), e.g. `deregistration_delay.timeout_seconds`.
pub type Attributes = BTreeMap<String, String>;

/// Resolved specification for one backend.
///
/// Produced fresh on every reconcile call and never cached.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredSpec {
    pub target_type: TargetType,
    pub backend_protocol: Protocol,
    pub health_check: HealthCheckSettings,
    pub attributes: Attributes,
}

/// The provider's live representation of a target group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub arn: String,
    pub name: String,
    /// Immutable once created
    pub target_type: TargetType,
    /// Immutable once created
    pub protocol: Protocol,
    pub port: i64,
    pub vpc_id: String,
    pub health_check: HealthCheckSettings,
}

/// Request to create a target group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetGroupRequest {
    pub name: String,
    pub target_type: TargetType,
    pub protocol: Protocol,
    pub port: i64,
    pub vpc_id: String,
    pub health_check: HealthCheckSettings,
}

/// Request to modify the mutable fields of a target group.
///
/// Always carries the complete desired health-check set, never a partial patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyTargetGroupRequest {
    pub arn: String,
    pub health_check: HealthCheckSettings,
}

/// Tags attached to a target group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Merge `overrides` on top of `self`, returning the keys whose values were replaced.
    ///
    /// Keys present in both sets take the value from `overrides`. The replaced keys
    /// are returned so callers can surface the shadowing instead of it happening silently.
    pub fn merge(&mut self, overrides: &TagSet) -> Vec<String> {
        let mut replaced = Vec::new();
        for (key, value) in &overrides.0 {
            if let Some(previous) = self.0.insert(key.clone(), value.clone()) {
                if previous != *value {
                    replaced.push(key.clone());
                }
            }
        }
        replaced
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A concrete registrable endpoint: instance id or IP, with an explicit port.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub port: i32,
}

impl Target {
    #[must_use]
    pub fn new(id: impl Into<String>, port: i32) -> Self {
        Self { id: id.into(), port }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.port)
    }
}

/// Desired registrations for one target group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSet {
    pub arn: String,
    pub target_type: TargetType,
    pub targets: Vec<Target>,
}

/// Read-only result of a successful reconcile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupView {
    pub arn: String,
    pub target_type: TargetType,
    pub targets: Vec<Target>,
}
