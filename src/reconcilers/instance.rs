// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Find-or-create-or-modify for the target group resource.
//!
//! A target group has two states in this module: absent and present. Absent
//! becomes present through [`InstanceManager::create`]; present stays present
//! through [`InstanceManager::reconcile_existing`], which only calls the provider
//! when tracked fields drifted. Deletion is never performed here.

use crate::constants::TARGET_GROUP_PLACEHOLDER_PORT;
use crate::directory::TargetGroupDirectory;
use crate::errors::{ProviderError, ReconcileError, Stage};
use crate::metrics;
use crate::reconcilers::drift::needs_modification;
use crate::reconcilers::until_cancelled;
use crate::types::{CreateTargetGroupRequest, DesiredSpec, ModifyTargetGroupRequest, TargetGroup};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Manages existence and health-check settings of target groups.
#[derive(Clone)]
pub struct InstanceManager {
    directory: Arc<dyn TargetGroupDirectory>,
    vpc_id: String,
}

impl InstanceManager {
    #[must_use]
    pub fn new(directory: Arc<dyn TargetGroupDirectory>, vpc_id: impl Into<String>) -> Self {
        Self {
            directory,
            vpc_id: vpc_id.into(),
        }
    }

    /// Return a present target group named `name` whose mutable fields match `spec`.
    ///
    /// If creation loses a race to a concurrent reconcile (the provider reports a
    /// duplicate name), the winner's target group is looked up again and adopted.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcileError`] classified as lookup, creation or modification.
    pub async fn ensure(
        &self,
        cancel: &CancellationToken,
        name: &str,
        spec: &DesiredSpec,
    ) -> Result<TargetGroup, ReconcileError> {
        if let Some(existing) = self.find_by_name(cancel, name).await? {
            return self.reconcile_existing(cancel, existing, spec).await;
        }

        match self.create(cancel, name, spec).await {
            Err(ReconcileError::Creation(ProviderError::AlreadyExists { name: taken })) => {
                warn!(
                    target_group = %taken,
                    "Target group was created concurrently, adopting existing target group"
                );
                match self.find_by_name(cancel, name).await? {
                    Some(existing) => self.reconcile_existing(cancel, existing, spec).await,
                    None => Err(ReconcileError::Creation(ProviderError::AlreadyExists {
                        name: taken,
                    })),
                }
            }
            other => other,
        }
    }

    /// Look up a target group by name; absence is a valid result.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Lookup`] if the provider lookup fails.
    pub async fn find_by_name(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<Option<TargetGroup>, ReconcileError> {
        let found = until_cancelled(cancel, Stage::Lookup, || self.directory.find_by_name(name))
            .await?
            .map_err(ReconcileError::Lookup)?;

        match &found {
            Some(instance) => {
                debug!(target_group = %name, arn = %instance.arn, "Found existing target group");
            }
            None => debug!(target_group = %name, "Target group does not exist"),
        }
        Ok(found)
    }

    /// Create a target group from `spec`.
    ///
    /// The request carries a placeholder port: every target is registered with an
    /// explicit port, so the nominal port is never used for traffic.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Creation`] if the provider rejects the request.
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        name: &str,
        spec: &DesiredSpec,
    ) -> Result<TargetGroup, ReconcileError> {
        let request = CreateTargetGroupRequest {
            name: name.to_string(),
            target_type: spec.target_type,
            protocol: spec.backend_protocol,
            port: TARGET_GROUP_PLACEHOLDER_PORT,
            vpc_id: self.vpc_id.clone(),
            health_check: spec.health_check.clone(),
        };

        let created = until_cancelled(cancel, Stage::Creation, || self.directory.create(request))
            .await?
            .and_then(require_arn)
            .map_err(ReconcileError::Creation)?;

        metrics::record_provider_mutation("create");
        info!(
            target_group = %name,
            arn = %created.arn,
            target_type = %spec.target_type,
            protocol = %spec.backend_protocol,
            "Created target group"
        );
        Ok(created)
    }

    /// Bring an existing target group's health-check settings in line with `spec`.
    ///
    /// Returns `instance` unchanged, without calling the provider, when nothing drifted.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Modification`] if the provider rejects the change.
    pub async fn reconcile_existing(
        &self,
        cancel: &CancellationToken,
        instance: TargetGroup,
        spec: &DesiredSpec,
    ) -> Result<TargetGroup, ReconcileError> {
        if instance.target_type != spec.target_type || instance.protocol != spec.backend_protocol
        {
            warn!(
                target_group = %instance.name,
                live_target_type = %instance.target_type,
                desired_target_type = %spec.target_type,
                live_protocol = %instance.protocol,
                desired_protocol = %spec.backend_protocol,
                "Target type and protocol cannot change after creation, keeping live values"
            );
        }

        if !needs_modification(&instance, spec) {
            debug!(target_group = %instance.name, "Target group already converged");
            return Ok(instance);
        }

        let request = ModifyTargetGroupRequest {
            arn: instance.arn.clone(),
            health_check: spec.health_check.clone(),
        };
        let modified = until_cancelled(cancel, Stage::Modification, || {
            self.directory.modify(request)
        })
        .await?
        .and_then(require_arn)
        .map_err(ReconcileError::Modification)?;

        metrics::record_provider_mutation("modify");
        info!(
            target_group = %modified.name,
            arn = %modified.arn,
            "Modified target group health check"
        );
        Ok(modified)
    }
}

fn require_arn(instance: TargetGroup) -> Result<TargetGroup, ProviderError> {
    if instance.arn.is_empty() {
        return Err(ProviderError::MissingArn {
            name: instance.name,
        });
    }
    Ok(instance)
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod instance_tests;
