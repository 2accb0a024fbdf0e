// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Attribute convergence for target groups.
//!
//! Only keys present in the desired bag are managed. Attributes the provider
//! reports beyond those are left alone, since the provider always returns its
//! full attribute set and some keys have no annotation.

use crate::errors::ProviderError;
use crate::metrics;
use crate::reconcilers::ensure_not_cancelled;
use crate::types::Attributes;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// Makes a target group's attributes match the desired bag.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AttributeReconciler: Send + Sync {
    /// Converge the attributes of `arn` to `attributes`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing attributes fails.
    async fn reconcile(
        &self,
        cancel: &CancellationToken,
        arn: &str,
        attributes: &Attributes,
    ) -> Result<()>;
}

/// Provider attribute operations used by [`ProviderAttributeReconciler`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AttributeApi: Send + Sync {
    async fn describe_attributes(&self, arn: &str) -> Result<Attributes, ProviderError>;

    async fn modify_attributes(&self, arn: &str, changes: &Attributes)
        -> Result<(), ProviderError>;
}

pub struct ProviderAttributeReconciler {
    api: Arc<dyn AttributeApi>,
}

impl ProviderAttributeReconciler {
    #[must_use]
    pub fn new(api: Arc<dyn AttributeApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AttributeReconciler for ProviderAttributeReconciler {
    async fn reconcile(
        &self,
        cancel: &CancellationToken,
        arn: &str,
        attributes: &Attributes,
    ) -> Result<()> {
        let current = self
            .api
            .describe_attributes(arn)
            .await
            .with_context(|| format!("failed to describe attributes of {arn}"))?;

        let changes = attribute_changes(&current, attributes);
        if changes.is_empty() {
            debug!(arn = %arn, "Attributes already converged");
            return Ok(());
        }

        ensure_not_cancelled(cancel, "modifying attributes")?;
        self.api
            .modify_attributes(arn, &changes)
            .await
            .with_context(|| format!("failed to modify attributes of {arn}"))?;
        metrics::record_provider_mutation("modify_attributes");

        info!(
            arn = %arn,
            keys = ?changes.keys().collect::<Vec<_>>(),
            "Converged target group attributes"
        );
        Ok(())
    }
}

/// Desired entries whose live value is missing or different.
#[must_use]
pub fn attribute_changes(current: &Attributes, desired: &Attributes) -> Attributes {
    desired
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod attributes_tests;
