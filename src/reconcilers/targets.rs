// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target registration convergence.
//!
//! Targets already draining are treated as deregistered: they are neither
//! deregistered again nor counted as present, so a desired target that is
//! draining gets registered anew.

use crate::constants::TARGET_STATE_DRAINING;
use crate::errors::ProviderError;
use crate::metrics;
use crate::reconcilers::ensure_not_cancelled;
use crate::types::{Target, TargetSet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// Makes a target group's registrations match a desired target set.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TargetReconciler: Send + Sync {
    /// Converge registrations of `desired.arn` to `desired.targets`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or changing registrations fails.
    async fn reconcile(&self, cancel: &CancellationToken, desired: &TargetSet) -> Result<()>;
}

/// A registration as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTarget {
    pub target: Target,
    /// Provider health state, e.g. `healthy`, `initial` or `draining`
    pub state: String,
}

impl RegisteredTarget {
    #[must_use]
    pub fn new(target: Target, state: impl Into<String>) -> Self {
        Self {
            target,
            state: state.into(),
        }
    }

    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.state == TARGET_STATE_DRAINING
    }
}

/// Provider registration operations used by [`ProviderTargetReconciler`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TargetApi: Send + Sync {
    async fn describe_targets(&self, arn: &str) -> Result<Vec<RegisteredTarget>, ProviderError>;

    async fn register_targets(&self, arn: &str, targets: &[Target]) -> Result<(), ProviderError>;

    async fn deregister_targets(&self, arn: &str, targets: &[Target])
        -> Result<(), ProviderError>;
}

pub struct ProviderTargetReconciler {
    api: Arc<dyn TargetApi>,
}

impl ProviderTargetReconciler {
    #[must_use]
    pub fn new(api: Arc<dyn TargetApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TargetReconciler for ProviderTargetReconciler {
    async fn reconcile(&self, cancel: &CancellationToken, desired: &TargetSet) -> Result<()> {
        let arn = desired.arn.as_str();
        let registered = self
            .api
            .describe_targets(arn)
            .await
            .with_context(|| format!("failed to describe targets of {arn}"))?;

        let current: BTreeSet<Target> = registered
            .into_iter()
            .filter(|registration| !registration.is_draining())
            .map(|registration| registration.target)
            .collect();
        let wanted: BTreeSet<Target> = desired.targets.iter().cloned().collect();

        let additions: Vec<Target> = wanted.difference(&current).cloned().collect();
        let removals: Vec<Target> = current.difference(&wanted).cloned().collect();

        if additions.is_empty() && removals.is_empty() {
            debug!(arn = %arn, targets = wanted.len(), "Targets already converged");
            return Ok(());
        }

        if !additions.is_empty() {
            ensure_not_cancelled(cancel, "registering targets")?;
            self.api
                .register_targets(arn, &additions)
                .await
                .with_context(|| format!("failed to register targets with {arn}"))?;
            metrics::record_provider_mutation("register_targets");
        }

        if !removals.is_empty() {
            ensure_not_cancelled(cancel, "deregistering targets")?;
            self.api
                .deregister_targets(arn, &removals)
                .await
                .with_context(|| format!("failed to deregister targets from {arn}"))?;
            metrics::record_provider_mutation("deregister_targets");
        }

        info!(
            arn = %arn,
            target_type = %desired.target_type,
            registered = additions.len(),
            deregistered = removals.len(),
            "Converged target registrations"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod targets_tests;
