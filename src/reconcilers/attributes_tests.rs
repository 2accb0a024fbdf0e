// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `attributes.rs`

#[cfg(test)]
mod tests {
    use crate::errors::ProviderError;
    use crate::reconcilers::attributes::{
        attribute_changes, AttributeReconciler, MockAttributeApi, ProviderAttributeReconciler,
    };
    use crate::types::Attributes;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_attribute_changes_ignores_unmanaged_keys() {
        let current = attrs(&[
            ("deregistration_delay.timeout_seconds", "300"),
            ("proxy_protocol_v2.enabled", "false"),
        ]);
        let desired = attrs(&[
            ("deregistration_delay.timeout_seconds", "30"),
            ("stickiness.enabled", "false"),
        ]);

        let changes = attribute_changes(&current, &desired);

        assert_eq!(
            changes,
            attrs(&[
                ("deregistration_delay.timeout_seconds", "30"),
                ("stickiness.enabled", "false"),
            ])
        );
    }

    #[tokio::test]
    async fn test_converged_attributes_make_no_mutation() {
        let mut api = MockAttributeApi::new();
        api.expect_describe_attributes()
            .returning(|_| Ok(attrs(&[("stickiness.enabled", "false"), ("extra", "1")])));
        api.expect_modify_attributes().never();

        ProviderAttributeReconciler::new(Arc::new(api))
            .reconcile(
                &CancellationToken::new(),
                "arn:tg/1",
                &attrs(&[("stickiness.enabled", "false")]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_modifies_only_changed_keys() {
        let mut api = MockAttributeApi::new();
        api.expect_describe_attributes().returning(|_| {
            Ok(attrs(&[
                ("stickiness.enabled", "false"),
                ("slow_start.duration_seconds", "0"),
            ]))
        });
        api.expect_modify_attributes()
            .times(1)
            .withf(|arn, changes| {
                arn == "arn:tg/1" && *changes == attrs(&[("slow_start.duration_seconds", "30")])
            })
            .returning(|_, _| Ok(()));

        ProviderAttributeReconciler::new(Arc::new(api))
            .reconcile(
                &CancellationToken::new(),
                "arn:tg/1",
                &attrs(&[
                    ("stickiness.enabled", "false"),
                    ("slow_start.duration_seconds", "30"),
                ]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_modify_failure_carries_context() {
        let mut api = MockAttributeApi::new();
        api.expect_describe_attributes()
            .returning(|_| Ok(Attributes::new()));
        api.expect_modify_attributes().returning(|_, _| {
            Err(ProviderError::InvalidParameter {
                reason: "slow start out of range".to_string(),
            })
        });

        let err = ProviderAttributeReconciler::new(Arc::new(api))
            .reconcile(
                &CancellationToken::new(),
                "arn:tg/1",
                &attrs(&[("slow_start.duration_seconds", "9000")]),
            )
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("failed to modify attributes of arn:tg/1"));
        assert!(message.contains("slow start out of range"));
    }
}
