// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Coordinate commands
//!
//! Commands: validate, show, migrate

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

use swarmgov_core::domain::coordinates::{CoordinateValidation, Position};

use crate::context::EngineContext;

#[derive(Subcommand)]
pub enum CoordsCommand {
    /// Check canonical and active coordinates against the canvas
    Validate,

    /// Print a coordinate table
    Show {
        /// Show the canonical table instead of the active one
        #[arg(long)]
        canonical: bool,
    },

    /// Convert the legacy coordinate list into the canonical table
    Migrate,
}

#[derive(Serialize)]
struct CoordinateCheck {
    canonical: CoordinateValidation,
    active: Option<CoordinateValidation>,
}

pub async fn handle_command(command: CoordsCommand, ctx: &EngineContext) -> Result<()> {
    match command {
        CoordsCommand::Validate => validate(ctx),
        CoordsCommand::Show { canonical } => show(ctx, canonical),
        CoordsCommand::Migrate => migrate(ctx),
    }
}

fn validate(ctx: &EngineContext) -> Result<()> {
    let stores = ctx.stores();
    let check = CoordinateCheck {
        canonical: stores.coordinates.validate_canonical()?,
        active: stores.coordinates.validate_active()?,
    };

    ctx.emit(&check, || {
        let canvas = stores.coordinates.canvas();
        println!(
            "Canvas: x [{}, {}], y [{}, {}]",
            canvas.min_x, canvas.max_x, canvas.min_y, canvas.max_y
        );
        print_check("Canonical", &check.canonical);
        match &check.active {
            Some(active) => print_check("Active", active),
            None => println!("  Active: {}", "(not applied yet)".dimmed()),
        }
    })?;

    let active_ok = check.active.as_ref().is_none_or(|active| active.ok);
    if !check.canonical.ok || !active_ok {
        anyhow::bail!("coordinate validation failed");
    }
    Ok(())
}

fn show(ctx: &EngineContext, canonical: bool) -> Result<()> {
    let stores = ctx.stores();
    let table: BTreeMap<u32, Position> = if canonical {
        stores.coordinates.load_canonical()?
    } else {
        stores.coordinates.load_active()?
    };

    ctx.emit(&table, || {
        if table.is_empty() {
            println!("{}", "No coordinates".yellow());
            return;
        }
        let key = if canonical { "AGENT" } else { "SLOT" };
        println!("{:<8} {}", key, "POSITION");
        for (id, position) in &table {
            println!("{:<8} {}", id, position);
        }
    })
}

fn migrate(ctx: &EngineContext) -> Result<()> {
    let migrated = ctx.stores().coordinates.migrate_legacy()?;

    ctx.emit(&migrated, || {
        if migrated {
            println!("{}", "✓ Legacy coordinates migrated".green());
        } else {
            println!("{}", "Nothing to migrate".dimmed());
        }
    })
}

fn print_check(label: &str, validation: &CoordinateValidation) {
    if validation.ok {
        println!("  {}: {}", label, "ok".green());
        return;
    }
    println!("  {}: {}", label, format!("{} issue(s)", validation.issues.len()).red());
    for issue in &validation.issues {
        println!("    {} {}", "✗".red(), issue);
    }
}
