// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `swarmgov-core`: Governance Core
//!
//! Everything the reconfiguration engine needs below the orchestration layer.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | coordinates, modes, validators, role registry, audit records, config manifest |
//! | [`infrastructure`] | Infrastructure | JSON artifact stores, audit ledger, snapshot store, switch lock |
//! | [`application`] | Application | `RoleService` (locked role assignment) |
//!
//! The switch lock in [`infrastructure::switch_lock`] serializes every
//! mutating operation across independent processes.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
