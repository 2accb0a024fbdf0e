// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target group reconciliation.
//!
//! # Reconciliation Architecture
//!
//! One call converges the target group of one (ingress, backend) pair:
//!
//! 1. **Resolve** - Build the desired spec from annotations
//! 2. **Name** - Derive the target group name deterministically
//! 3. **Instance** - Find the target group, create it, or modify drifted health checks
//! 4. **Tags** - Converge ownership tags
//! 5. **Attributes** - Converge provider attributes
//! 6. **Targets** - Converge registered targets
//!
//! Stages run in this order and fail fast. Nothing is rolled back: a target group
//! created before a later stage fails stays in place and the next reconcile picks
//! it up, because every stage is a no-op once converged.
//!
//! # Available Reconcilers
//!
//! - [`TargetGroupReconciler`] - The entry point, composing all stages
//! - [`InstanceManager`] - Find-or-create-or-modify for the target group itself
//! - [`tags`], [`attributes`], [`targets`] - Facet contracts and provider-backed defaults

pub mod attributes;
pub mod drift;
pub mod instance;
pub mod tags;
pub mod targetgroup;
pub mod targets;

pub use attributes::{AttributeApi, AttributeReconciler, ProviderAttributeReconciler};
pub use drift::needs_modification;
pub use instance::InstanceManager;
pub use tags::{ProviderTagReconciler, TagApi, TagReconciler};
pub use targetgroup::{merge_tags, TargetGroupReconciler};
pub use targets::{ProviderTargetReconciler, RegisteredTarget, TargetApi, TargetReconciler};

use crate::errors::{ReconcileError, Stage};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run the provider call built by `call` unless `cancel` fires first.
///
/// An already-cancelled token returns before `call` is invoked, so no request is sent.
pub(crate) async fn until_cancelled<F, Fut>(
    cancel: &CancellationToken,
    stage: Stage,
    call: F,
) -> Result<Fut::Output, ReconcileError>
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    if cancel.is_cancelled() {
        return Err(ReconcileError::Cancelled { stage });
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ReconcileError::Cancelled { stage }),
        output = call() => Ok(output),
    }
}

/// Fail before a facet mutation once the caller has cancelled.
pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken, action: &str) -> anyhow::Result<()> {
    if cancel.is_cancelled() {
        anyhow::bail!("cancelled before {action}");
    }
    Ok(())
}
