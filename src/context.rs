// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reflector stores shared by the desired-state and endpoint resolvers.
//!
//! Every resolver reads from the same in-memory caches, populated by reflector
//! tasks owned by the surrounding control loop. Reads are O(1) by
//! `namespace/name` and never hit the API server.

use k8s_openapi::api::core::v1::{Endpoints, Node, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::reflector::{self, ObjectRef, Store};
use kube::runtime::watcher;
use std::hash::Hash;
use std::sync::Arc;

/// Collection of reflector stores read during reconciliation.
#[derive(Clone)]
pub struct Stores {
    pub ingresses: Store<Ingress>,
    pub services: Store<Service>,
    pub endpoints: Store<Endpoints>,
    pub nodes: Store<Node>,
}

impl Stores {
    #[must_use]
    pub fn new(
        ingresses: Store<Ingress>,
        services: Store<Service>,
        endpoints: Store<Endpoints>,
        nodes: Store<Node>,
    ) -> Self {
        Self {
            ingresses,
            services,
            endpoints,
            nodes,
        }
    }

    /// Stores pre-populated with fixed object lists, with no watcher behind them.
    #[must_use]
    pub fn from_objects(
        ingresses: Vec<Ingress>,
        services: Vec<Service>,
        endpoints: Vec<Endpoints>,
        nodes: Vec<Node>,
    ) -> Self {
        Self::new(
            store_from(ingresses),
            store_from(services),
            store_from(endpoints),
            store_from(nodes),
        )
    }

    #[must_use]
    pub fn ingress(&self, namespace: &str, name: &str) -> Option<Arc<Ingress>> {
        self.ingresses
            .get(&ObjectRef::new(name).within(namespace))
    }

    #[must_use]
    pub fn service(&self, namespace: &str, name: &str) -> Option<Arc<Service>> {
        self.services.get(&ObjectRef::new(name).within(namespace))
    }

    /// Endpoints share the name of the service they belong to.
    #[must_use]
    pub fn endpoints(&self, namespace: &str, service_name: &str) -> Option<Arc<Endpoints>> {
        self.endpoints
            .get(&ObjectRef::new(service_name).within(namespace))
    }

    /// All nodes whose `Ready` condition is `True`.
    #[must_use]
    pub fn ready_nodes(&self) -> Vec<Arc<Node>> {
        self.nodes
            .state()
            .into_iter()
            .filter(|node| {
                node.status
                    .as_ref()
                    .and_then(|status| status.conditions.as_ref())
                    .is_some_and(|conditions| {
                        conditions
                            .iter()
                            .any(|c| c.type_ == "Ready" && c.status == "True")
                    })
            })
            .collect()
    }
}

/// Build a reader over `objects` by replaying them into a fresh store writer.
pub fn store_from<K>(objects: impl IntoIterator<Item = K>) -> Store<K>
where
    K: kube::Resource + Clone + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    let (reader, mut writer) = reflector::store();
    for object in objects {
        writer.apply_watcher_event(&watcher::Event::Apply(object));
    }
    reader
}

/// `namespace/name` key used in messages and lookups.
#[must_use]
pub fn namespaced_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
