// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider capability for looking up, creating and modifying target groups.
//!
//! The reconcilers only depend on this trait, so they can be exercised against a
//! fake provider without network access. A production implementation wraps the
//! provider's load-balancing API client and maps its error codes onto
//! [`ProviderError`] (in particular, duplicate-name rejections onto
//! [`ProviderError::AlreadyExists`]).

use crate::errors::ProviderError;
use crate::types::{CreateTargetGroupRequest, ModifyTargetGroupRequest, TargetGroup};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Find, create and modify target groups.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TargetGroupDirectory: Send + Sync {
    /// Look up a target group by name.
    ///
    /// A missing target group is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the lookup itself fails.
    async fn find_by_name(&self, name: &str) -> Result<Option<TargetGroup>, ProviderError>;

    /// Create a target group and return the provider's representation of it.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AlreadyExists`] on a name collision, or another
    /// [`ProviderError`] if the provider rejects the request.
    async fn create(&self, request: CreateTargetGroupRequest)
        -> Result<TargetGroup, ProviderError>;

    /// Apply the health-check settings in `request` and return the updated representation.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the provider rejects the change.
    async fn modify(&self, request: ModifyTargetGroupRequest)
        -> Result<TargetGroup, ProviderError>;
}
