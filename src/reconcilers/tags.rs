// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tag convergence for target groups.

use crate::errors::ProviderError;
use crate::metrics;
use crate::reconcilers::ensure_not_cancelled;
use crate::types::TagSet;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// Makes a target group carry exactly the given tag set.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TagReconciler: Send + Sync {
    /// Converge the tags on `arn` to `tags`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing tags fails.
    async fn reconcile(&self, cancel: &CancellationToken, arn: &str, tags: &TagSet)
        -> Result<()>;
}

/// Provider tag operations used by [`ProviderTagReconciler`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TagApi: Send + Sync {
    async fn describe_tags(&self, arn: &str) -> Result<TagSet, ProviderError>;

    /// Add or overwrite `tags`.
    async fn add_tags(&self, arn: &str, tags: &TagSet) -> Result<(), ProviderError>;

    async fn remove_tags(&self, arn: &str, keys: &[String]) -> Result<(), ProviderError>;
}

/// [`TagReconciler`] that diffs live tags and applies only the changes.
pub struct ProviderTagReconciler {
    api: Arc<dyn TagApi>,
}

impl ProviderTagReconciler {
    #[must_use]
    pub fn new(api: Arc<dyn TagApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TagReconciler for ProviderTagReconciler {
    async fn reconcile(
        &self,
        cancel: &CancellationToken,
        arn: &str,
        tags: &TagSet,
    ) -> Result<()> {
        let current = self
            .api
            .describe_tags(arn)
            .await
            .with_context(|| format!("failed to describe tags of {arn}"))?;

        let (upserts, removals) = tag_changes(&current, tags);
        if upserts.is_empty() && removals.is_empty() {
            debug!(arn = %arn, "Tags already converged");
            return Ok(());
        }

        if !upserts.is_empty() {
            ensure_not_cancelled(cancel, "adding tags")?;
            self.api
                .add_tags(arn, &upserts)
                .await
                .with_context(|| format!("failed to add tags to {arn}"))?;
            metrics::record_provider_mutation("add_tags");
        }

        if !removals.is_empty() {
            ensure_not_cancelled(cancel, "removing tags")?;
            self.api
                .remove_tags(arn, &removals)
                .await
                .with_context(|| format!("failed to remove tags from {arn}"))?;
            metrics::record_provider_mutation("remove_tags");
        }

        info!(
            arn = %arn,
            upserted = upserts.len(),
            removed = removals.len(),
            "Converged target group tags"
        );
        Ok(())
    }
}

/// Tags to add or overwrite, and keys to remove, to turn `current` into `desired`.
#[must_use]
pub fn tag_changes(current: &TagSet, desired: &TagSet) -> (TagSet, Vec<String>) {
    let upserts = desired
        .iter()
        .filter(|(key, value)| current.get(key) != Some(value.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let removals = current
        .keys()
        .filter(|key| !desired.contains_key(key))
        .cloned()
        .collect();
    (upserts, removals)
}

#[cfg(test)]
#[path = "tags_tests.rs"]
mod tags_tests;
