// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Collaborator seams used by the reconfiguration manager.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** `ActivationExecutor` and `StatusProvider` traits, `ReconfigurationManager`

pub mod reconfiguration;

pub use reconfiguration::ReconfigurationManager;

use async_trait::async_trait;
use swarmgov_core::domain::coordinates::AgentId;

/// Brings a newly included agent online during apply.
#[async_trait]
pub trait ActivationExecutor: Send + Sync {
    /// `false` when the agent could not be activated. Never aborts a switch.
    async fn activate(&self, agent: AgentId) -> bool;
}

/// Reports agent activity for the busy-agent gate.
#[async_trait]
pub trait StatusProvider: Send + Sync {
    /// True when the agent reported a busy state within the freshness window.
    async fn is_busy(&self, agent: AgentId) -> bool;

    /// Outstanding blockers that forbid reconfiguration.
    async fn open_blockers(&self) -> Vec<String> {
        Vec::new()
    }
}
