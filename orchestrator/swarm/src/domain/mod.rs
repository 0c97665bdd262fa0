// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Reconfiguration Domain Layer
//!
//! Pure types for mode switching. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`reconfiguration`] | `SwitchPhase`, `ForceScope`, `SwitchOptions`, `SwitchOutcome`, `ModePlan` |

pub mod reconfiguration;

pub use reconfiguration::*;
