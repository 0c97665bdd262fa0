// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # swarmgov CLI
//!
//! The `swarmgov` binary reconfigures a running agent swarm and governs its
//! roles. Every invocation works directly on the configured state directory;
//! concurrent invocations coordinate through the switch lock.
//!
//! ## Commands
//!
//! - `swarmgov mode list|status|history|plan|switch|rollback` - Swarm size
//! - `swarmgov role list|get|catalog|assign|unassign` - Role registry
//! - `swarmgov coords validate|show|migrate` - Coordinate tables
//! - `swarmgov config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use swarmgov::commands::{self, ConfigCommand, CoordsCommand, ModeCommand, RoleCommand};
use swarmgov::context::EngineContext;

/// Swarm governance - safe mode switching and role assignment
#[derive(Parser)]
#[command(name = "swarmgov")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SWARMGOV_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SWARMGOV_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Swarm size management
    #[command(name = "mode")]
    Mode {
        #[command(subcommand)]
        command: ModeCommand,
    },

    /// Role assignment
    #[command(name = "role")]
    Role {
        #[command(subcommand)]
        command: RoleCommand,
    },

    /// Coordinate tables
    #[command(name = "coords")]
    Coords {
        #[command(subcommand)]
        command: CoordsCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Mode { command }) => {
            let ctx = EngineContext::load(cli.config, cli.json)?;
            commands::mode::handle_command(command, &ctx).await
        }
        Some(Commands::Role { command }) => {
            let ctx = EngineContext::load(cli.config, cli.json)?;
            commands::role::handle_command(command, &ctx).await
        }
        Some(Commands::Coords { command }) => {
            let ctx = EngineContext::load(cli.config, cli.json)?;
            commands::coords::handle_command(command, &ctx).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
