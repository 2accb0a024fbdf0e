// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration.
//!
//! Configuration is read once at startup, either from the environment or from a
//! YAML/JSON document, and shared read-only by every reconcile call.

use crate::constants::{
    DEFAULT_ANNOTATION_PREFIX, ENV_ANNOTATION_PREFIX, ENV_CLUSTER_NAME, ENV_NAME_PREFIX,
    ENV_VPC_ID,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Settings shared by all target group reconciles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Kubernetes cluster name, used in the cluster ownership tag
    pub cluster_name: String,

    /// Prefix for generated target group names (defaults to the cluster name)
    #[serde(default)]
    pub name_prefix: Option<String>,

    /// VPC in which target groups are created
    pub vpc_id: String,

    /// Annotation prefix read by the desired-state resolver
    #[serde(default = "default_annotation_prefix")]
    pub annotation_prefix: String,
}

fn default_annotation_prefix() -> String {
    DEFAULT_ANNOTATION_PREFIX.to_string()
}

impl ControllerConfig {
    /// Load configuration from `ALB_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or the result fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or the result fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cluster_name =
            lookup(ENV_CLUSTER_NAME).with_context(|| format!("{ENV_CLUSTER_NAME} is not set"))?;
        let vpc_id = lookup(ENV_VPC_ID).with_context(|| format!("{ENV_VPC_ID} is not set"))?;

        let config = Self {
            cluster_name,
            name_prefix: lookup(ENV_NAME_PREFIX).filter(|p| !p.is_empty()),
            vpc_id,
            annotation_prefix: lookup(ENV_ANNOTATION_PREFIX)
                .filter(|p| !p.is_empty())
                .unwrap_or_else(default_annotation_prefix),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML (or JSON) document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_yaml_str(document: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(document).context("Failed to parse controller configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster name, VPC id or annotation prefix is empty.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.trim().is_empty() {
            bail!("clusterName must not be empty");
        }
        if self.vpc_id.trim().is_empty() {
            bail!("vpcId must not be empty");
        }
        if self.annotation_prefix.trim().is_empty() {
            bail!("annotationPrefix must not be empty");
        }
        Ok(())
    }

    /// Prefix used for generated names.
    #[must_use]
    pub fn effective_name_prefix(&self) -> &str {
        self.name_prefix.as_deref().unwrap_or(&self.cluster_name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
