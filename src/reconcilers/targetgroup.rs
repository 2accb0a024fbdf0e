// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target group reconciler.
//!
//! [`TargetGroupReconciler::reconcile`] is called by the ingress control loop once
//! per (ingress, backend) pair. It returns a read-only [`TargetGroupView`] used to
//! wire listener rules, or a [`ReconcileError`] naming the stage that failed.

use crate::config::ControllerConfig;
use crate::context::Stores;
use crate::directory::TargetGroupDirectory;
use crate::endpoints::{EndpointResolver, StoreEndpointResolver};
use crate::errors::{ReconcileError, Stage};
use crate::metrics;
use crate::naming::{NameTagGenerator, NamingStrategy};
use crate::reconcilers::attributes::{
    AttributeApi, AttributeReconciler, ProviderAttributeReconciler,
};
use crate::reconcilers::instance::InstanceManager;
use crate::reconcilers::tags::{ProviderTagReconciler, TagApi, TagReconciler};
use crate::reconcilers::targets::{ProviderTargetReconciler, TargetApi, TargetReconciler};
use crate::reconcilers::until_cancelled;
use crate::resolver::{AnnotationResolver, DesiredStateResolver};
use crate::types::{BackendRef, IngressRef, TagSet, TargetGroupView, TargetSet};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Converges one target group per ingress backend.
///
/// Stateless between calls and safe to share: concurrent calls for different
/// backends proceed independently.
#[derive(Clone)]
pub struct TargetGroupReconciler {
    instances: InstanceManager,
    resolver: Arc<dyn DesiredStateResolver>,
    naming: Arc<dyn NamingStrategy>,
    tags: Arc<dyn TagReconciler>,
    attributes: Arc<dyn AttributeReconciler>,
    targets: Arc<dyn TargetReconciler>,
    endpoints: Arc<dyn EndpointResolver>,
}

impl TargetGroupReconciler {
    #[must_use]
    pub fn new(
        instances: InstanceManager,
        resolver: Arc<dyn DesiredStateResolver>,
        naming: Arc<dyn NamingStrategy>,
        tags: Arc<dyn TagReconciler>,
        attributes: Arc<dyn AttributeReconciler>,
        targets: Arc<dyn TargetReconciler>,
        endpoints: Arc<dyn EndpointResolver>,
    ) -> Self {
        Self {
            instances,
            resolver,
            naming,
            tags,
            attributes,
            targets,
            endpoints,
        }
    }

    /// Wire the default collaborators around a single provider client.
    ///
    /// Annotations and endpoints are read from `stores`; names and tags follow
    /// `config`.
    #[must_use]
    pub fn with_provider<P>(config: &ControllerConfig, stores: Stores, provider: Arc<P>) -> Self
    where
        P: TargetGroupDirectory + TagApi + AttributeApi + TargetApi + 'static,
    {
        let directory: Arc<dyn TargetGroupDirectory> = provider.clone();
        let tag_api: Arc<dyn TagApi> = provider.clone();
        let attribute_api: Arc<dyn AttributeApi> = provider.clone();
        let target_api: Arc<dyn TargetApi> = provider;

        Self::new(
            InstanceManager::new(directory, config.vpc_id.clone()),
            Arc::new(AnnotationResolver::new(
                stores.clone(),
                config.annotation_prefix.clone(),
            )),
            Arc::new(NameTagGenerator::new(
                config.effective_name_prefix(),
                config.cluster_name.clone(),
            )),
            Arc::new(ProviderTagReconciler::new(tag_api)),
            Arc::new(ProviderAttributeReconciler::new(attribute_api)),
            Arc::new(ProviderTargetReconciler::new(target_api)),
            Arc::new(StoreEndpointResolver::new(stores)),
        )
    }

    /// Converge the target group serving `backend` of `ingress`.
    ///
    /// Stages run in order (desired state, instance, tags, attributes, targets)
    /// and the first failure is returned. Earlier stages are not rolled back.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcileError`] classified by the failing stage, or
    /// [`ReconcileError::Cancelled`] if `cancel` fired during a provider call.
    pub async fn reconcile(
        &self,
        cancel: &CancellationToken,
        ingress: &IngressRef,
        backend: &BackendRef,
    ) -> Result<TargetGroupView, ReconcileError> {
        let start = Instant::now();
        info!(ingress = %ingress, backend = %backend, "Reconciling target group");

        let result = self.reconcile_stages(cancel, ingress, backend).await;
        let duration = start.elapsed();

        match &result {
            Ok(view) => {
                metrics::record_reconciliation_success(duration);
                info!(
                    ingress = %ingress,
                    backend = %backend,
                    arn = %view.arn,
                    targets = view.targets.len(),
                    "Target group reconciled"
                );
            }
            Err(e) if e.is_cancelled() => {
                metrics::record_reconciliation_error(e.stage(), true, duration);
                warn!(
                    ingress = %ingress,
                    backend = %backend,
                    stage = %e.stage(),
                    "Reconcile cancelled"
                );
            }
            Err(e) => {
                metrics::record_reconciliation_error(e.stage(), false, duration);
                error!(
                    ingress = %ingress,
                    backend = %backend,
                    stage = %e.stage(),
                    error = %e,
                    "Failed to reconcile target group"
                );
            }
        }
        result
    }

    async fn reconcile_stages(
        &self,
        cancel: &CancellationToken,
        ingress: &IngressRef,
        backend: &BackendRef,
    ) -> Result<TargetGroupView, ReconcileError> {
        if cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled {
                stage: Stage::Configuration,
            });
        }

        let spec = self
            .resolver
            .resolve(ingress, &backend.service_name)
            .map_err(ReconcileError::Configuration)?;

        let name = self
            .naming
            .name_for(ingress, backend, spec.target_type, spec.backend_protocol);
        debug!(
            target_group = %name,
            ingress = %ingress,
            backend = %backend,
            "Derived target group name"
        );

        let instance = self.instances.ensure(cancel, &name, &spec).await?;
        // Registration type is immutable, so targets follow the live group.
        let target_type = instance.target_type;
        let arn = instance.arn;

        let tags = merge_tags(
            self.naming.group_tags(ingress),
            &self.naming.resource_tags(backend),
        );
        until_cancelled(cancel, Stage::Tags, || self.tags.reconcile(cancel, &arn, &tags))
            .await?
            .map_err(ReconcileError::Tags)?;

        until_cancelled(cancel, Stage::Attributes, || {
            self.attributes.reconcile(cancel, &arn, &spec.attributes)
        })
        .await?
        .map_err(ReconcileError::Attributes)?;

        let targets = until_cancelled(cancel, Stage::Targets, || {
            self.endpoints.resolve(ingress, backend, target_type)
        })
        .await?
        .with_context(|| format!("failed to resolve endpoints of {backend}"))
        .map_err(ReconcileError::Targets)?;

        let desired = TargetSet {
            arn,
            target_type,
            targets,
        };
        until_cancelled(cancel, Stage::Targets, || {
            self.targets.reconcile(cancel, &desired)
        })
        .await?
        .map_err(ReconcileError::Targets)?;

        Ok(TargetGroupView {
            arn: desired.arn,
            target_type: desired.target_type,
            targets: desired.targets,
        })
    }
}

/// Merge backend-scoped tags over ingress-scoped tags.
///
/// Keys present in both take the resource value. Shadowed keys are logged.
#[must_use]
pub fn merge_tags(group: TagSet, resource: &TagSet) -> TagSet {
    let mut merged = group;
    let replaced = merged.merge(resource);
    if !replaced.is_empty() {
        debug!(keys = ?replaced, "Resource tags override group tags");
    }
    merged
}

#[cfg(test)]
#[path = "targetgroup_tests.rs"]
mod targetgroup_tests;
