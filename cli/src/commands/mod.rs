// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the swarmgov CLI

pub mod config;
pub mod coords;
pub mod mode;
pub mod role;

pub use self::config::ConfigCommand;
pub use self::coords::CoordsCommand;
pub use self::mode::ModeCommand;
pub use self::role::RoleCommand;
