// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Pure governance types and rules. No I/O apart from the signed-intent
//! existence check in [`validation::validate_switch_request`].
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Coordinates, modes, validators, roles, audit records, config schema

pub mod audit;
pub mod coordinates;
pub mod error;
pub mod governance_config;
pub mod lock;
pub mod mode;
pub mod roles;
pub mod validation;

pub use error::GovernanceError;
