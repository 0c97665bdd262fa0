// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `swarmgov-swarm`: Swarm Reconfiguration
//!
//! Changes the active swarm size safely: one reconfiguration at a time across
//! processes, validated before it is applied, audited whichever way it ends,
//! and reversible from the snapshot taken before it.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `SwitchPhase`, `ForceScope`, `SwitchOptions`, outcomes |
//! | [`application`] | Application | `ReconfigurationManager`, `ActivationExecutor`, `StatusProvider` |
//! | [`infrastructure`] | Infrastructure | `FileStatusProvider`, `CommandActivationExecutor`, `NoopActivationExecutor` |
//!
//! ## Key Concepts
//!
//! - **Mode**: a supported swarm size (2, 4, 5, 6 or 8) with a read-only preset.
//! - **Switch lock**: OS advisory lock plus lease, shared with role assignment
//!   and rollback (see `swarmgov_core::infrastructure::switch_lock`).
//! - **Force scope**: `Operational` skips the lock timeout and the busy-agent
//!   gate; `Full` also skips the validator gate. Neither skips owner/target checks.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
