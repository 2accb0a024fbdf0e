// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `targets.rs`

#[cfg(test)]
mod tests {
    use crate::errors::ProviderError;
    use crate::reconcilers::targets::{
        MockTargetApi, ProviderTargetReconciler, RegisteredTarget, TargetReconciler,
    };
    use crate::types::{Target, TargetSet, TargetType};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const ARN: &str = "arn:tg/1";

    fn desired(targets: Vec<Target>) -> TargetSet {
        TargetSet {
            arn: ARN.to_string(),
            target_type: TargetType::Ip,
            targets,
        }
    }

    #[tokio::test]
    async fn test_registers_and_deregisters_difference() {
        let mut api = MockTargetApi::new();
        api.expect_describe_targets().returning(|_| {
            Ok(vec![
                RegisteredTarget::new(Target::new("10.0.0.1", 8080), "healthy"),
                RegisteredTarget::new(Target::new("10.0.0.9", 8080), "healthy"),
            ])
        });
        api.expect_register_targets()
            .times(1)
            .withf(|arn, targets| arn == ARN && targets == [Target::new("10.0.0.2", 8080)])
            .returning(|_, _| Ok(()));
        api.expect_deregister_targets()
            .times(1)
            .withf(|arn, targets| arn == ARN && targets == [Target::new("10.0.0.9", 8080)])
            .returning(|_, _| Ok(()));

        ProviderTargetReconciler::new(Arc::new(api))
            .reconcile(
                &CancellationToken::new(),
                &desired(vec![
                    Target::new("10.0.0.1", 8080),
                    Target::new("10.0.0.2", 8080),
                ]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_converged_targets_make_no_mutation() {
        let mut api = MockTargetApi::new();
        api.expect_describe_targets().returning(|_| {
            Ok(vec![RegisteredTarget::new(
                Target::new("i-0abc", 30080),
                "initial",
            )])
        });
        api.expect_register_targets().never();
        api.expect_deregister_targets().never();

        ProviderTargetReconciler::new(Arc::new(api))
            .reconcile(
                &CancellationToken::new(),
                &desired(vec![Target::new("i-0abc", 30080)]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_draining_targets_are_not_deregistered_again() {
        let mut api = MockTargetApi::new();
        api.expect_describe_targets().returning(|_| {
            Ok(vec![RegisteredTarget::new(
                Target::new("10.0.0.5", 80),
                "draining",
            )])
        });
        api.expect_register_targets().never();
        api.expect_deregister_targets().never();

        ProviderTargetReconciler::new(Arc::new(api))
            .reconcile(&CancellationToken::new(), &desired(vec![]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_draining_target_that_is_desired_is_registered() {
        let mut api = MockTargetApi::new();
        api.expect_describe_targets().returning(|_| {
            Ok(vec![RegisteredTarget::new(
                Target::new("10.0.0.5", 80),
                "draining",
            )])
        });
        api.expect_register_targets()
            .times(1)
            .returning(|_, _| Ok(()));

        ProviderTargetReconciler::new(Arc::new(api))
            .reconcile(
                &CancellationToken::new(),
                &desired(vec![Target::new("10.0.0.5", 80)]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_register_failure_skips_deregistration() {
        let mut api = MockTargetApi::new();
        api.expect_describe_targets().returning(|_| {
            Ok(vec![RegisteredTarget::new(
                Target::new("10.0.0.9", 80),
                "healthy",
            )])
        });
        api.expect_register_targets().returning(|_, _| {
            Err(ProviderError::Api {
                operation: "RegisterTargets".to_string(),
                code: "InvalidTarget".to_string(),
                message: "target is not in the VPC".to_string(),
            })
        });
        api.expect_deregister_targets().never();

        let err = ProviderTargetReconciler::new(Arc::new(api))
            .reconcile(
                &CancellationToken::new(),
                &desired(vec![Target::new("10.0.0.1", 80)]),
            )
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("failed to register targets with arn:tg/1"));
    }
}
