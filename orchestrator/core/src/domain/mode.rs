// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Mode Domain
//!
//! A **mode** is a supported swarm size. Each mode has a read-only
//! [`ModePreset`] declaring which canonical agents participate and which
//! active slot each one occupies. The currently applied mode is materialized
//! as an [`ActiveConfiguration`].
//!
//! ## Invariants (outside an in-flight switch)
//!
//! - `include.len() == mode`
//! - every id in `mapping` has a canonical position
//! - every active position lies inside the configured canvas
//! - role policy holds over `assignments` (see [`crate::domain::roles`])

use crate::domain::coordinates::{ActiveCoordinates, ActiveIndex, AgentId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Swarm sizes a preset may exist for.
pub const SUPPORTED_MODES: [u8; 5] = [2, 4, 5, 6, 8];

/// Placeholder role for a slot with no role.
pub const UNASSIGNED: &str = "unassigned";

pub fn is_supported_mode(mode: u8) -> bool {
    SUPPORTED_MODES.contains(&mode)
}

/// Owners allowed to reconfigure the swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    Captain,
    CoCaptain,
}

impl Authority {
    pub fn parse(owner: &str) -> Option<Self> {
        match owner {
            "captain" => Some(Self::Captain),
            "co_captain" => Some(Self::CoCaptain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Captain => "captain",
            Self::CoCaptain => "co_captain",
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only participation table for one swarm size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePreset {
    /// Declared size. Preset files omit it; the loader fills it from the file name.
    #[serde(default)]
    pub size: u8,
    pub include: Vec<AgentId>,
    pub mapping: BTreeMap<AgentId, ActiveIndex>,
}

/// The currently applied mode.
///
/// `coordinates` is persisted in its own artifact and is not part of the
/// serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConfiguration {
    pub mode: u8,
    pub include: Vec<AgentId>,
    pub mapping: BTreeMap<AgentId, ActiveIndex>,
    /// Catalog roles available while this configuration is active.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub assignments: BTreeMap<ActiveIndex, String>,
    #[serde(skip)]
    pub coordinates: ActiveCoordinates,
}

impl ActiveConfiguration {
    pub fn includes(&self, agent: AgentId) -> bool {
        self.include.contains(&agent)
    }

    pub fn active_index_of(&self, agent: AgentId) -> Option<ActiveIndex> {
        self.mapping.get(&agent).copied()
    }

    pub fn agent_at(&self, index: ActiveIndex) -> Option<AgentId> {
        self.mapping
            .iter()
            .find(|(_, i)| **i == index)
            .map(|(agent, _)| *agent)
    }

    /// Role held by `agent`, `None` when the agent has no slot or no entry.
    pub fn role_of(&self, agent: AgentId) -> Option<&str> {
        let index = self.active_index_of(agent)?;
        self.assignments.get(&index).map(String::as_str)
    }

    /// Active indexes currently holding `role`.
    pub fn holders(&self, role: &str) -> Vec<ActiveIndex> {
        self.assignments
            .iter()
            .filter(|(_, r)| r.as_str() == role)
            .map(|(index, _)| *index)
            .collect()
    }
}

/// Agents entering and leaving the swarm across a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDiff {
    pub activated: Vec<AgentId>,
    pub deactivated: Vec<AgentId>,
}

impl ModeDiff {
    pub fn between(current: &[AgentId], target: &[AgentId]) -> Self {
        let current: BTreeSet<_> = current.iter().copied().collect();
        let target: BTreeSet<_> = target.iter().copied().collect();
        Self {
            activated: target.difference(&current).copied().collect(),
            deactivated: current.difference(&target).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.activated.is_empty() && self.deactivated.is_empty()
    }
}
