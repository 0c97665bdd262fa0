// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Mode commands
//!
//! Commands: list, status, history, plan, switch, rollback

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use swarmgov_core::domain::mode::ModeDiff;
use swarmgov_core::domain::validation::ValidationReport;
use swarmgov_core::domain::GovernanceError;
use swarmgov_swarm::domain::{ForceScope, SwitchOptions};

use crate::context::EngineContext;

#[derive(Subcommand)]
pub enum ModeCommand {
    /// List modes that have a preset on disk
    List,

    /// Show the active mode, lock holder and switch counters
    Status,

    /// Show completed mode switches
    History {
        /// Show only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate a switch without applying it
    Plan {
        /// Target swarm size
        #[arg(value_name = "MODE")]
        target: u8,
    },

    /// Switch the active swarm size
    Switch {
        /// Target swarm size
        #[arg(value_name = "MODE")]
        target: u8,

        /// Who is requesting the switch (captain or co_captain)
        #[arg(long, default_value = "captain")]
        owner: String,

        /// Bypass lock timeout, busy agents and validators
        #[arg(long, conflicts_with = "force_operational")]
        force: bool,

        /// Bypass lock timeout and busy agents only
        #[arg(long)]
        force_operational: bool,

        /// Signed intent file (default: spec.signature_path)
        #[arg(long, value_name = "FILE")]
        signature: Option<PathBuf>,
    },

    /// Restore the configuration saved before the last switch
    Rollback {
        /// Who is requesting the rollback (captain or co_captain)
        #[arg(long, default_value = "captain")]
        owner: String,
    },
}

pub async fn handle_command(command: ModeCommand, ctx: &EngineContext) -> Result<()> {
    match command {
        ModeCommand::List => list(ctx),
        ModeCommand::Status => status(ctx),
        ModeCommand::History { limit } => history(ctx, limit),
        ModeCommand::Plan { target } => plan(ctx, target),
        ModeCommand::Switch {
            target,
            owner,
            force,
            force_operational,
            signature,
        } => {
            let scope = if force {
                ForceScope::Full
            } else if force_operational {
                ForceScope::Operational
            } else {
                ForceScope::None
            };
            switch(ctx, target, owner, scope, signature).await
        }
        ModeCommand::Rollback { owner } => rollback(ctx, &owner).await,
    }
}

fn list(ctx: &EngineContext) -> Result<()> {
    let manager = ctx.manager();
    let modes = manager.stores().catalog.available_modes();
    let current = manager.current_mode()?;

    ctx.emit(&modes, || {
        if modes.is_empty() {
            println!("{}", "No mode presets found".yellow());
            return;
        }
        println!("Available modes:");
        for mode in &modes {
            if Some(*mode) == current {
                println!("  {} {}", mode.to_string().bold(), "(active)".green());
            } else {
                println!("  {}", mode);
            }
        }
    })
}

fn status(ctx: &EngineContext) -> Result<()> {
    let status = ctx.manager().status()?;

    ctx.emit(&status, || {
        println!("{}", "Swarm status:".bold());
        match status.mode {
            Some(mode) => println!("  Mode: {}", mode.to_string().bold()),
            None => println!("  Mode: {}", "(none)".dimmed()),
        }
        println!("  Agents: {:?}", status.include);
        match &status.lock_holder {
            Some(holder) if status.lock_stale => println!(
                "  Lock: {}",
                format!("stale lease from '{}' (pid {})", holder.owner, holder.pid).yellow()
            ),
            Some(holder) => println!("  Lock: held by '{}' (pid {})", holder.owner, holder.pid),
            None => println!("  Lock: {}", "free".dimmed()),
        }
        println!(
            "  Switches: {} succeeded, {} failed",
            status.counters.success, status.counters.failure
        );
        println!("  Snapshots: {}", status.snapshots);
        if let Some(changed) = status.last_change {
            println!("  Last change: {}", changed.to_rfc3339());
        }
        if let Some(report) = &status.last_report {
            print_report(report);
        }
    })
}

fn history(ctx: &EngineContext, limit: Option<usize>) -> Result<()> {
    let mut entries = ctx.manager().history()?;
    if let Some(limit) = limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }

    ctx.emit(&entries, || {
        if entries.is_empty() {
            println!("{}", "No mode switches recorded".yellow());
            return;
        }
        println!("{:<34} {:<6} {:<6} {}", "TIMESTAMP", "FROM", "TO", "OWNER");
        for entry in &entries {
            println!(
                "{:<34} {:<6} {:<6} {}",
                entry.timestamp.to_rfc3339(),
                entry.from.map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
                entry.to,
                entry.owner
            );
        }
    })
}

fn plan(ctx: &EngineContext, target: u8) -> Result<()> {
    let plan = ctx.manager().plan_mode(target).map_err(|e| ctx.rejected(e))?;

    ctx.emit(&plan, || {
        println!(
            "Plan: {} → {}",
            plan.current.map(|m| m.to_string()).unwrap_or_else(|| "(none)".into()),
            plan.target.to_string().bold()
        );
        print_diff(&plan.diff);
        println!("  Slots: {}", plan.coordinates.len());
        print_report(&plan.report);
    })?;

    if !plan.is_applicable() {
        anyhow::bail!("mode {} cannot be applied as planned", target);
    }
    Ok(())
}

async fn switch(
    ctx: &EngineContext,
    target: u8,
    owner: String,
    force: ForceScope,
    signature: Option<PathBuf>,
) -> Result<()> {
    let mut options = SwitchOptions::new(owner).with_force(force);
    if let Some(path) = signature.or_else(|| ctx.config.spec.signature_path.clone()) {
        options = options.with_signature(path);
    }

    if !ctx.json {
        println!("Switching swarm to mode {}...", target.to_string().bold());
    }

    let outcome = match ctx.manager().switch_mode(target, options).await {
        Ok(outcome) => outcome,
        Err(err) => {
            if let (GovernanceError::Validation(report), false) = (&err, ctx.json) {
                print_report(report);
            }
            return Err(ctx.rejected(err));
        }
    };

    ctx.emit(&outcome, || {
        println!(
            "{}",
            format!(
                "✓ Mode switched: {} → {}",
                outcome.from.map(|m| m.to_string()).unwrap_or_else(|| "(none)".into()),
                outcome.to
            )
            .green()
        );
        print_diff(&outcome.diff);
        if outcome.forced {
            println!("{}", "  Forced switch".yellow());
        }
        if !outcome.activation_failures.is_empty() {
            println!(
                "{}",
                format!("⚠ Activation failed for agents {:?}", outcome.activation_failures).yellow()
            );
        }
        print_report(&outcome.report);
        println!("  Snapshot: {}", outcome.snapshot.display());
    })
}

async fn rollback(ctx: &EngineContext, owner: &str) -> Result<()> {
    let outcome = ctx
        .manager()
        .rollback_mode(owner)
        .await
        .map_err(|e| ctx.rejected(e))?;

    ctx.emit(&outcome, || {
        let restored = outcome
            .restored
            .map(|m| format!("mode {}", m))
            .unwrap_or_else(|| "empty configuration".into());
        println!("{}", format!("✓ Rolled back to {}", restored).green());
        println!("  Snapshot: {}", outcome.snapshot.display());
    })
}

fn print_diff(diff: &ModeDiff) {
    if diff.is_empty() {
        println!("  No agent changes");
        return;
    }
    if !diff.activated.is_empty() {
        println!("  Activate: {:?}", diff.activated);
    }
    if !diff.deactivated.is_empty() {
        println!("  Deactivate: {:?}", diff.deactivated);
    }
}

fn print_report(report: &ValidationReport) {
    if report.ok {
        println!("  Validation: {}", "ok".green());
    } else {
        println!("  Validation: {}", "failed".red());
    }
    for error in &report.errors {
        println!("    {} {}", "✗".red(), error);
    }
    for warning in &report.warnings {
        println!("    {} {}", "⚠".yellow(), warning);
    }
}
