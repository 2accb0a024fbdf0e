// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use alb_targetgroup::{
    config::ControllerConfig,
    constants::DEFAULT_ANNOTATION_PREFIX,
    naming::{NameTagGenerator, NamingStrategy},
    plan::plan_manifests,
    reconcilers::merge_tags,
    types::{BackendRef, IngressRef, Protocol, ServicePort, TargetType},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

/// Target group naming and planning for Kubernetes ingress backends
#[derive(Parser, Debug)]
#[command(name = "alb-targetgroup", version, about, long_about = None)]
struct Cli {
    /// Controller configuration file (YAML or JSON)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Cluster name used in ownership tags (overrides the configuration file)
    #[arg(long, global = true)]
    cluster_name: Option<String>,

    /// Prefix for generated names (defaults to the cluster name)
    #[arg(long, global = true)]
    name_prefix: Option<String>,

    /// Annotation prefix read from ingresses and services
    #[arg(long, global = true)]
    annotation_prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the target group name for one backend
    Name {
        #[command(flatten)]
        backend: BackendArgs,

        #[arg(long, default_value = "instance")]
        target_type: TargetType,

        #[arg(long, default_value = "HTTP")]
        protocol: Protocol,
    },

    /// Print the merged ownership tags for one backend as JSON
    Tags {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Resolve every ingress backend in a manifest bundle and print the plan as JSON
    Plan {
        /// Multi-document YAML or JSON file with Ingress and Service manifests
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BackendArgs {
    #[arg(long, default_value = "default")]
    namespace: String,

    /// Ingress name
    #[arg(long)]
    ingress: String,

    /// Backend service name
    #[arg(long)]
    service: String,

    /// Backend service port, by number or name
    #[arg(long)]
    port: String,
}

impl BackendArgs {
    fn refs(&self) -> (IngressRef, BackendRef) {
        let port = self
            .port
            .parse::<i32>()
            .map_or_else(|_| ServicePort::Name(self.port.clone()), ServicePort::Number);
        (
            IngressRef::new(self.namespace.clone(), self.ingress.clone()),
            BackendRef::new(self.service.clone(), port),
        )
    }
}

/// Naming inputs after layering command-line flags over the configuration file.
#[derive(Debug)]
struct NamingSettings {
    cluster_name: String,
    name_prefix: String,
    annotation_prefix: String,
}

impl NamingSettings {
    fn load(cli: &Cli) -> Result<Self> {
        let file = Self::base_config(cli)?;

        let cluster_name = cli
            .cluster_name
            .clone()
            .or_else(|| file.as_ref().map(|c| c.cluster_name.clone()))
            .context("Either --cluster-name or --config is required")?;
        let name_prefix = cli
            .name_prefix
            .clone()
            .or_else(|| file.as_ref().map(|c| c.effective_name_prefix().to_string()))
            .unwrap_or_else(|| cluster_name.clone());
        let annotation_prefix = cli
            .annotation_prefix
            .clone()
            .or_else(|| file.as_ref().map(|c| c.annotation_prefix.clone()))
            .unwrap_or_else(|| DEFAULT_ANNOTATION_PREFIX.to_string());

        Ok(Self {
            cluster_name,
            name_prefix,
            annotation_prefix,
        })
    }

    /// The configuration file if given, else `ALB_*` variables when no cluster name was passed.
    fn base_config(cli: &Cli) -> Result<Option<ControllerConfig>> {
        match (&cli.config, &cli.cluster_name) {
            (Some(path), _) => {
                let document = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                ControllerConfig::from_yaml_str(&document).map(Some)
            }
            (None, None) => ControllerConfig::from_env().map(Some).context(
                "Either --cluster-name, --config or the ALB_* environment variables are required",
            ),
            (None, Some(_)) => Ok(None),
        }
    }
}

fn init_tracing() {
    // Respects RUST_LOG if set, otherwise defaults to INFO level.
    // RUST_LOG_FORMAT=json switches to structured output.
    // Logs go to stderr so stdout stays machine-readable.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    debug!(command = ?cli.command, "Parsed command line");

    let settings = NamingSettings::load(&cli)?;
    let naming = NameTagGenerator::new(settings.name_prefix, settings.cluster_name);

    match &cli.command {
        Commands::Name {
            backend,
            target_type,
            protocol,
        } => {
            let (ingress, backend) = backend.refs();
            println!("{}", naming.name_for(&ingress, &backend, *target_type, *protocol));
        }
        Commands::Tags { backend } => {
            let (ingress, backend) = backend.refs();
            let tags = merge_tags(naming.group_tags(&ingress), &naming.resource_tags(&backend));
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
        Commands::Plan { file } => {
            let document = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let plans = plan_manifests(&document, &naming, &settings.annotation_prefix)?;
            info!(backends = plans.len(), file = %file.display(), "Planned target groups");
            println!("{}", serde_json::to_string_pretty(&plans)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
