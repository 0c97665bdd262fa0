// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Role commands
//!
//! Commands: list, get, catalog, assign, unassign

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use swarmgov_core::domain::coordinates::AgentId;
use swarmgov_core::domain::roles::{AssignmentOutcome, ViolationHandling};

use crate::context::EngineContext;

#[derive(Subcommand)]
pub enum RoleCommand {
    /// Show role assignments in the active mode
    List,

    /// Show one agent's role
    Get {
        #[arg(value_name = "AGENT")]
        agent: AgentId,
    },

    /// Show the role catalog
    Catalog,

    /// Assign a role to an agent
    Assign {
        #[arg(value_name = "AGENT")]
        agent: AgentId,

        #[arg(value_name = "ROLE")]
        role: String,

        /// Refuse instead of demoting when the role policy is violated
        #[arg(long)]
        reject_on_conflict: bool,
    },

    /// Clear an agent's role
    Unassign {
        #[arg(value_name = "AGENT")]
        agent: AgentId,
    },
}

pub async fn handle_command(command: RoleCommand, ctx: &EngineContext) -> Result<()> {
    match command {
        RoleCommand::List => list(ctx),
        RoleCommand::Get { agent } => get(ctx, agent),
        RoleCommand::Catalog => catalog(ctx),
        RoleCommand::Assign {
            agent,
            role,
            reject_on_conflict,
        } => {
            let handling = reject_on_conflict.then_some(ViolationHandling::Reject);
            let outcome = ctx
                .roles()
                .assign_role(agent, &role, handling)
                .await
                .map_err(|e| ctx.rejected(e))?;
            report(ctx, &outcome)
        }
        RoleCommand::Unassign { agent } => {
            let outcome = ctx
                .roles()
                .unassign_role(agent)
                .await
                .map_err(|e| ctx.rejected(e))?;
            report(ctx, &outcome)
        }
    }
}

fn list(ctx: &EngineContext) -> Result<()> {
    let assignments = ctx.roles().list_assignments()?;

    ctx.emit(&assignments, || {
        if assignments.is_empty() {
            println!("{}", "No active configuration".yellow());
            return;
        }
        println!("{:<8} {:<8} {}", "AGENT", "SLOT", "ROLE");
        for slot in &assignments {
            let role = if slot.role == "unassigned" {
                slot.role.dimmed().to_string()
            } else {
                slot.role.clone()
            };
            println!("{:<8} {:<8} {}", slot.agent, slot.index, role);
        }
    })
}

fn get(ctx: &EngineContext, agent: AgentId) -> Result<()> {
    let role = ctx.roles().get_role(agent)?;

    ctx.emit(&role, || match &role {
        Some(role) => println!("{}", role),
        None => println!("{}", format!("Agent {} is not in the active mode", agent).yellow()),
    })
}

fn catalog(ctx: &EngineContext) -> Result<()> {
    let catalog = ctx.roles().catalog()?;

    ctx.emit(&catalog, || {
        println!("{} roles:", catalog.roles.len());
        for entry in catalog.roles.values() {
            if entry.description.is_empty() {
                println!("  {}", entry.name.bold());
            } else {
                println!("  {} - {}", entry.name.bold(), entry.description);
            }
        }
    })
}

fn report(ctx: &EngineContext, outcome: &AssignmentOutcome) -> Result<()> {
    ctx.emit(outcome, || {
        if outcome.ok {
            println!(
                "{}",
                format!(
                    "✓ Agent {}: {} ({})",
                    outcome.agent,
                    outcome.current.as_deref().unwrap_or("unassigned"),
                    outcome.reason.as_str()
                )
                .green()
            );
        } else {
            println!(
                "{}",
                format!(
                    "✗ Agent {}: '{}' refused ({})",
                    outcome.agent,
                    outcome.requested,
                    outcome.reason.as_str()
                )
                .red()
            );
        }
    })?;

    if !outcome.ok {
        anyhow::bail!("role change refused: {}", outcome.reason.as_str());
    }
    Ok(())
}
