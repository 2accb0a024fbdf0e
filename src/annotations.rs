// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Translation of ingress and service annotations into a [`DesiredSpec`].
//!
//! Annotations are read from two levels. Ingress annotations apply to every
//! backend of the ingress; service annotations override them key by key for the
//! backends that route to that service. Missing keys fall back to provider-aligned
//! defaults (see [`crate::constants`]).
//!
//! # Example
//!
//! ```rust
//! use alb_targetgroup::annotations::{merge_annotations, parse_desired_spec};
//! use alb_targetgroup::types::TargetType;
//! use std::collections::BTreeMap;
//!
//! let ingress = BTreeMap::from([(
//!     "alb.ingress.kubernetes.io/target-type".to_string(),
//!     "ip".to_string(),
//! )]);
//! let merged = merge_annotations(Some(&ingress), None);
//!
//! let spec = parse_desired_spec(&merged, "alb.ingress.kubernetes.io").unwrap();
//! assert_eq!(spec.target_type, TargetType::Ip);
//! assert_eq!(spec.health_check.path.as_deref(), Some("/"));
//! ```

use crate::constants::{
    DEFAULT_HEALTHCHECK_INTERVAL_SECS, DEFAULT_HEALTHCHECK_PATH,
    DEFAULT_HEALTHCHECK_TIMEOUT_SECS, DEFAULT_HEALTHY_THRESHOLD_COUNT, DEFAULT_SUCCESS_CODES,
    DEFAULT_TARGET_GROUP_ATTRIBUTES, DEFAULT_UNHEALTHY_THRESHOLD_COUNT,
    HEALTHCHECK_PORT_TRAFFIC_PORT, MAX_HEALTHCHECK_INTERVAL_SECS, MAX_HEALTHCHECK_TIMEOUT_SECS,
    MAX_THRESHOLD_COUNT, MIN_HEALTHCHECK_INTERVAL_SECS, MIN_HEALTHCHECK_TIMEOUT_SECS,
    MIN_THRESHOLD_COUNT,
};
use crate::errors::ConfigError;
use crate::labels::{
    annotation_key, ANNOTATION_BACKEND_PROTOCOL, ANNOTATION_HEALTHCHECK_INTERVAL,
    ANNOTATION_HEALTHCHECK_PATH, ANNOTATION_HEALTHCHECK_PORT, ANNOTATION_HEALTHCHECK_PROTOCOL,
    ANNOTATION_HEALTHCHECK_TIMEOUT, ANNOTATION_HEALTHY_THRESHOLD, ANNOTATION_SUCCESS_CODES,
    ANNOTATION_TARGET_GROUP_ATTRIBUTES, ANNOTATION_TARGET_TYPE, ANNOTATION_UNHEALTHY_THRESHOLD,
};
use crate::types::{Attributes, DesiredSpec, HealthCheckSettings, Protocol, TargetType};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Merge ingress-level and service-level annotations; service values win.
#[must_use]
pub fn merge_annotations(
    ingress: Option<&BTreeMap<String, String>>,
    service: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let mut merged = ingress.cloned().unwrap_or_default();
    if let Some(service) = service {
        merged.extend(service.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Parse a merged annotation map into a validated [`DesiredSpec`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidAnnotation`] for unparsable or out-of-range values
/// and [`ConfigError::InvalidHealthCheck`] when the timeout is not below the interval.
pub fn parse_desired_spec(
    annotations: &BTreeMap<String, String>,
    prefix: &str,
) -> Result<DesiredSpec, ConfigError> {
    let reader = AnnotationReader {
        annotations,
        prefix,
    };

    let target_type =
        reader.parse_or::<TargetType>(ANNOTATION_TARGET_TYPE, TargetType::Instance)?;
    let backend_protocol =
        reader.parse_or::<Protocol>(ANNOTATION_BACKEND_PROTOCOL, Protocol::Http)?;

    let interval = reader.int_in_range(
        ANNOTATION_HEALTHCHECK_INTERVAL,
        DEFAULT_HEALTHCHECK_INTERVAL_SECS,
        MIN_HEALTHCHECK_INTERVAL_SECS..=MAX_HEALTHCHECK_INTERVAL_SECS,
    )?;
    let timeout = reader.int_in_range(
        ANNOTATION_HEALTHCHECK_TIMEOUT,
        DEFAULT_HEALTHCHECK_TIMEOUT_SECS,
        MIN_HEALTHCHECK_TIMEOUT_SECS..=MAX_HEALTHCHECK_TIMEOUT_SECS,
    )?;
    if timeout >= interval {
        return Err(ConfigError::InvalidHealthCheck {
            reason: format!(
                "timeout ({timeout}s) must be smaller than the interval ({interval}s)"
            ),
        });
    }

    let health_check = HealthCheckSettings {
        path: Some(reader.path()?),
        port: Some(reader.health_check_port()?),
        protocol: Some(
            reader.parse_or::<Protocol>(ANNOTATION_HEALTHCHECK_PROTOCOL, Protocol::Http)?,
        ),
        interval_seconds: Some(interval),
        timeout_seconds: Some(timeout),
        success_codes: Some(reader.success_codes()?),
        healthy_threshold_count: Some(reader.int_in_range(
            ANNOTATION_HEALTHY_THRESHOLD,
            DEFAULT_HEALTHY_THRESHOLD_COUNT,
            MIN_THRESHOLD_COUNT..=MAX_THRESHOLD_COUNT,
        )?),
        unhealthy_threshold_count: Some(reader.int_in_range(
            ANNOTATION_UNHEALTHY_THRESHOLD,
            DEFAULT_UNHEALTHY_THRESHOLD_COUNT,
            MIN_THRESHOLD_COUNT..=MAX_THRESHOLD_COUNT,
        )?),
    };

    Ok(DesiredSpec {
        target_type,
        backend_protocol,
        health_check,
        attributes: reader.attributes()?,
    })
}

struct AnnotationReader<'a> {
    annotations: &'a BTreeMap<String, String>,
    prefix: &'a str,
}

impl AnnotationReader<'_> {
    fn lookup(&self, suffix: &str) -> (String, Option<&str>) {
        let key = annotation_key(self.prefix, suffix);
        let value = self.annotations.get(&key).map(|v| v.trim());
        (key, value)
    }

    fn invalid(key: String, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidAnnotation {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_or<T>(&self, suffix: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr<Err = String>,
    {
        match self.lookup(suffix) {
            (_, None) => Ok(default),
            (key, Some(raw)) => raw.parse().map_err(|e| Self::invalid(key, raw, e)),
        }
    }

    fn int_in_range(
        &self,
        suffix: &str,
        default: i64,
        range: std::ops::RangeInclusive<i64>,
    ) -> Result<i64, ConfigError> {
        let (key, raw) = self.lookup(suffix);
        let Some(raw) = raw else {
            return Ok(default);
        };
        let value: i64 = raw
            .parse()
            .map_err(|_| Self::invalid(key.clone(), raw, "not an integer"))?;
        if !range.contains(&value) {
            return Err(Self::invalid(
                key,
                raw,
                format!("must be between {} and {}", range.start(), range.end()),
            ));
        }
        Ok(value)
    }

    fn path(&self) -> Result<String, ConfigError> {
        match self.lookup(ANNOTATION_HEALTHCHECK_PATH) {
            (_, None) => Ok(DEFAULT_HEALTHCHECK_PATH.to_string()),
            (key, Some(raw)) if !raw.starts_with('/') => {
                Err(Self::invalid(key, raw, "must start with '/'"))
            }
            (_, Some(raw)) => Ok(raw.to_string()),
        }
    }

    fn health_check_port(&self) -> Result<String, ConfigError> {
        match self.lookup(ANNOTATION_HEALTHCHECK_PORT) {
            (_, None) => Ok(HEALTHCHECK_PORT_TRAFFIC_PORT.to_string()),
            (_, Some(raw)) if raw == HEALTHCHECK_PORT_TRAFFIC_PORT => Ok(raw.to_string()),
            (key, Some(raw)) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => Ok(port.to_string()),
                _ => Err(Self::invalid(
                    key,
                    raw,
                    "must be 'traffic-port' or a port between 1 and 65535",
                )),
            },
        }
    }

    fn success_codes(&self) -> Result<String, ConfigError> {
        match self.lookup(ANNOTATION_SUCCESS_CODES) {
            (_, None) => Ok(DEFAULT_SUCCESS_CODES.to_string()),
            (key, Some(raw)) => {
                let valid = !raw.is_empty()
                    && raw.split(',').all(|part| {
                        let mut bounds = part.trim().splitn(2, '-');
                        bounds.all(|code| {
                            code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit())
                        })
                    });
                if valid {
                    Ok(raw.to_string())
                } else {
                    Err(Self::invalid(
                        key,
                        raw,
                        "expected codes like '200', '200,202' or '200-299'",
                    ))
                }
            }
        }
    }

    fn attributes(&self) -> Result<Attributes, ConfigError> {
        let mut attributes: Attributes = DEFAULT_TARGET_GROUP_ATTRIBUTES
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        let (key, raw) = self.lookup(ANNOTATION_TARGET_GROUP_ATTRIBUTES);
        let Some(raw) = raw else {
            return Ok(attributes);
        };
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((attr_key, attr_value)) = entry.split_once('=') else {
                return Err(Self::invalid(
                    key,
                    raw,
                    format!("entry '{entry}' is not of the form key=value"),
                ));
            };
            let attr_key = attr_key.trim();
            if attr_key.is_empty() {
                return Err(Self::invalid(key, raw, format!("entry '{entry}' has an empty key")));
            }
            attributes.insert(attr_key.to_string(), attr_value.trim().to_string());
        }
        Ok(attributes)
    }
}

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod annotations_tests;
