// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use swarmgov_core::domain::governance_config::GovernanceConfig;

pub const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
pub const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./swarmgov-config.yaml)
        #[arg(short, long, default_value = "./swarmgov-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GovernanceConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. SWARMGOV_CONFIG_PATH: {}",
            std::env::var("SWARMGOV_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./swarmgov-config.yaml");
        println!("  4. ~/.swarmgov/config.yaml");
        println!("  5. /etc/swarmgov/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let spec = &config.spec;
    println!("{}", "Paths:".bold());
    println!("  Config dir: {}", spec.paths.config_dir.display());
    println!("  State dir: {}", spec.paths.state_dir.display());
    println!();

    println!("{}", "Canvas:".bold());
    println!("  x: [{}, {}]", spec.canvas.min_x, spec.canvas.max_x);
    println!("  y: [{}, {}]", spec.canvas.min_y, spec.canvas.max_y);
    println!();

    println!("{}", "Switch lock:".bold());
    println!("  Poll interval: {}ms", spec.lock.poll_interval_ms);
    println!("  Timeout: {}ms", spec.lock.timeout_ms);
    println!("  Lease TTL: {}s", spec.lock.lease_ttl_seconds);
    println!();

    println!("{}", "Roles:".bold());
    let unique: Vec<&str> = spec.roles.policy.unique_roles.iter().map(String::as_str).collect();
    println!("  Unique: {}", unique.join(", "));
    for (role, cap) in &spec.roles.policy.capacity {
        println!("  Capacity {}: {}", role, cap);
    }
    println!("  On violation: {:?}", spec.roles.violation_handling);
    println!();

    println!("{}", "Operations:".bold());
    println!("  Busy freshness: {}s", spec.status.freshness_seconds);
    match spec.snapshots.retention {
        Some(keep) => println!("  Snapshot retention: {}", keep),
        None => println!("  Snapshot retention: {}", "unbounded".dimmed()),
    }
    match &spec.activation.command {
        Some(command) => println!("  Activation: {}", command.join(" ")),
        None => println!("  Activation: {}", "(none)".dimmed()),
    }
    if let Some(path) = &spec.signature_path {
        println!("  Signature: {}", path.display());
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GovernanceConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmgov_core::domain::roles::ViolationHandling;

    #[test]
    fn test_templates_are_valid_configs() {
        for template in [MINIMAL_TEMPLATE, EXAMPLES_TEMPLATE] {
            let config = GovernanceConfig::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_examples_template_sets_every_section() {
        let config = GovernanceConfig::from_yaml_str(EXAMPLES_TEMPLATE).unwrap();
        assert_eq!(config.spec.lock.timeout_ms, 10_000);
        assert_eq!(config.spec.snapshots.retention, Some(50));
        assert_eq!(config.spec.roles.violation_handling, ViolationHandling::AutoDemote);
        assert!(config.spec.roles.policy.is_unique("captain"));
        assert!(config.spec.activation.command.is_some());
    }

    #[tokio::test]
    async fn test_generate_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("swarmgov-config.yaml");
        generate(output.clone(), false).await.unwrap();
        assert_eq!(std::fs::read_to_string(output).unwrap(), MINIMAL_TEMPLATE);
    }
}
