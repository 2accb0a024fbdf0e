// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `main.rs` - configuration layering for naming inputs

#[cfg(test)]
mod tests {
    use crate::{Cli, NamingSettings};
    use alb_targetgroup::constants::{
        DEFAULT_ANNOTATION_PREFIX, ENV_ANNOTATION_PREFIX, ENV_CLUSTER_NAME, ENV_NAME_PREFIX,
        ENV_VPC_ID,
    };
    use clap::Parser;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["alb-targetgroup"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&[
            "name",
            "--ingress",
            "web",
            "--service",
            "api",
            "--port",
            "http",
        ]);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cluster_name_flag_alone_is_enough() {
        let settings = NamingSettings::load(&parse(&["--cluster-name", "prod-east"])).unwrap();

        assert_eq!(settings.cluster_name, "prod-east");
        assert_eq!(settings.name_prefix, "prod-east");
        assert_eq!(settings.annotation_prefix, DEFAULT_ANNOTATION_PREFIX);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "clusterName: from-file\nvpcId: vpc-1\nnamePrefix: file").unwrap();
        let path = file.path().to_str().unwrap();

        let settings =
            NamingSettings::load(&parse(&["-c", path, "--name-prefix", "flag"])).unwrap();

        assert_eq!(settings.cluster_name, "from-file");
        assert_eq!(settings.name_prefix, "flag");
    }

    // The only test in this binary that touches ALB_* variables.
    #[test]
    fn test_environment_fills_in_without_config_or_flag() {
        for key in [
            ENV_CLUSTER_NAME,
            ENV_VPC_ID,
            ENV_NAME_PREFIX,
            ENV_ANNOTATION_PREFIX,
        ] {
            std::env::remove_var(key);
        }
        let err = NamingSettings::load(&parse(&[])).unwrap_err();
        assert!(format!("{err:#}").contains(ENV_CLUSTER_NAME));

        std::env::set_var(ENV_CLUSTER_NAME, "env-cluster");
        std::env::set_var(ENV_VPC_ID, "vpc-0123");
        std::env::set_var(ENV_ANNOTATION_PREFIX, "example.com");
        let settings = NamingSettings::load(&parse(&[])).unwrap();

        assert_eq!(settings.cluster_name, "env-cluster");
        assert_eq!(settings.name_prefix, "env-cluster");
        assert_eq!(settings.annotation_prefix, "example.com");
    }
}
