// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Builders for Kubernetes objects and reflector stores used by unit tests.

use crate::context::Stores;
use k8s_openapi::api::core::v1::{
    EndpointAddress, EndpointPort, EndpointSubset, Endpoints, Node, NodeCondition, NodeSpec,
    NodeStatus, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

pub(crate) fn stores(
    ingresses: Vec<Ingress>,
    services: Vec<Service>,
    endpoints: Vec<Endpoints>,
    nodes: Vec<Node>,
) -> Stores {
    Stores::from_objects(ingresses, services, endpoints, nodes)
}

fn meta(namespace: Option<&str>, name: &str, annotations: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        annotations: if annotations.is_empty() {
            None
        } else {
            Some(
                annotations
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect::<BTreeMap<_, _>>(),
            )
        },
        ..Default::default()
    }
}

pub(crate) fn ingress(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> Ingress {
    Ingress {
        metadata: meta(Some(namespace), name, annotations),
        ..Default::default()
    }
}

/// A service port: (name, port, target port, node port).
pub(crate) type PortSpec<'a> = (Option<&'a str>, i32, IntOrString, Option<i32>);

pub(crate) fn service(
    namespace: &str,
    name: &str,
    annotations: &[(&str, &str)],
    ports: Vec<PortSpec<'_>>,
) -> Service {
    Service {
        metadata: meta(Some(namespace), name, annotations),
        spec: Some(ServiceSpec {
            ports: Some(
                ports
                    .into_iter()
                    .map(|(port_name, port, target_port, node_port)| ServicePort {
                        name: port_name.map(str::to_string),
                        port,
                        target_port: Some(target_port),
                        node_port,
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Endpoints with one subset: ready IPs, not-ready IPs, and (name, port) pairs.
pub(crate) fn endpoints(
    namespace: &str,
    name: &str,
    ready: &[&str],
    not_ready: &[&str],
    ports: &[(Option<&str>, i32)],
) -> Endpoints {
    let addresses = |ips: &[&str]| -> Option<Vec<EndpointAddress>> {
        Some(
            ips.iter()
                .map(|ip| EndpointAddress {
                    ip: (*ip).to_string(),
                    ..Default::default()
                })
                .collect(),
        )
    };
    Endpoints {
        metadata: meta(Some(namespace), name, &[]),
        subsets: Some(vec![EndpointSubset {
            addresses: addresses(ready),
            not_ready_addresses: addresses(not_ready),
            ports: Some(
                ports
                    .iter()
                    .map(|(port_name, port)| EndpointPort {
                        name: port_name.map(str::to_string),
                        port: *port,
                        ..Default::default()
                    })
                    .collect(),
            ),
        }]),
    }
}

pub(crate) fn node(name: &str, provider_id: Option<&str>, ready: bool) -> Node {
    Node {
        metadata: meta(None, name, &[]),
        spec: Some(NodeSpec {
            provider_id: provider_id.map(str::to_string),
            ..Default::default()
        }),
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}
