// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Role Registry Domain
//!
//! Role catalog, role policy and the assignment decision logic.
//!
//! Assignment is split into two steps so callers choose how violations are
//! handled:
//!
//! 1. [`RoleRegistry::check_policy`] is pure and returns a [`PolicyDecision`].
//! 2. [`RoleRegistry::apply`] mutates an [`ActiveConfiguration`] according to
//!    the decision and a [`ViolationHandling`].
//!
//! With [`ViolationHandling::AutoDemote`] a policy violation still writes the
//! slot, forced to [`UNASSIGNED`]. With [`ViolationHandling::Reject`] the slot
//! keeps its prior value.

use crate::domain::coordinates::{ActiveIndex, AgentId};
use crate::domain::mode::{ActiveConfiguration, UNASSIGNED};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One role as declared in the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalogEntry {
    /// Filled from the catalog key on load.
    #[serde(default, skip_serializing)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "extraProcedures")]
    pub extra_procedures: Vec<String>,
}

/// `{ "roles": { "<name>": { description, extra_procedures } } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalog {
    #[serde(default)]
    pub roles: BTreeMap<String, RoleCatalogEntry>,
}

impl RoleCatalog {
    /// Copy map keys into each entry's `name`.
    pub fn normalized(mut self) -> Self {
        for (name, entry) in self.roles.iter_mut() {
            entry.name = name.clone();
        }
        self
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    pub fn get(&self, role: &str) -> Option<&RoleCatalogEntry> {
        self.roles.get(role)
    }

    pub fn names(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }
}

/// Uniqueness and capacity rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePolicy {
    #[serde(default)]
    pub unique_roles: BTreeSet<String>,
    #[serde(default)]
    pub capacity: BTreeMap<String, usize>,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            unique_roles: BTreeSet::from(["captain".to_string()]),
            capacity: BTreeMap::from([("co_captain".to_string(), 2)]),
        }
    }
}

impl RolePolicy {
    pub fn is_unique(&self, role: &str) -> bool {
        self.unique_roles.contains(role)
    }

    pub fn capacity_of(&self, role: &str) -> Option<usize> {
        self.capacity.get(role).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationHandling {
    /// Write the slot as `unassigned`.
    #[default]
    AutoDemote,
    /// Leave the slot untouched.
    Reject,
}

/// Result code of one assignment attempt. Also the `result` of its history event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentReason {
    Assigned,
    Unassigned,
    AgentNotInMode,
    UnknownRole,
    RoleUniqueConflict,
    RoleCapExceeded,
}

impl AssignmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::AgentNotInMode => "agent_not_in_mode",
            Self::UnknownRole => "unknown_role",
            Self::RoleUniqueConflict => "role_unique_conflict",
            Self::RoleCapExceeded => "role_cap_exceeded",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Assigned | Self::Unassigned)
    }

    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::RoleUniqueConflict | Self::RoleCapExceeded)
    }
}

impl fmt::Display for AssignmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Slot may take the role.
    Grant {
        agent: AgentId,
        index: ActiveIndex,
        role: String,
    },
    /// Slot exists but the role would break policy.
    Violation {
        agent: AgentId,
        index: ActiveIndex,
        role: String,
        reason: AssignmentReason,
    },
    /// Nothing can be written (agent not in mode, unknown role).
    Refused {
        agent: AgentId,
        role: String,
        reason: AssignmentReason,
    },
}

impl PolicyDecision {
    pub fn reason(&self) -> AssignmentReason {
        match self {
            Self::Grant { .. } => AssignmentReason::Assigned,
            Self::Violation { reason, .. } | Self::Refused { reason, .. } => *reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    pub ok: bool,
    pub reason: AssignmentReason,
    pub agent: AgentId,
    /// Role requested by the caller.
    pub requested: String,
    /// Role the slot holds after the call, if the agent has a slot.
    pub current: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHistoryEvent {
    pub timestamp: DateTime<Utc>,
    pub agent: AgentId,
    pub role: String,
    pub result: AssignmentReason,
}

impl RoleHistoryEvent {
    pub fn from_outcome(outcome: &AssignmentOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            agent: outcome.agent,
            role: outcome.requested.clone(),
            result: outcome.reason,
        }
    }
}

/// `{ "events": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHistory {
    #[serde(default)]
    pub events: Vec<RoleHistoryEvent>,
}

/// Stateless policy engine over a catalog and a policy.
pub struct RoleRegistry<'a> {
    catalog: &'a RoleCatalog,
    policy: &'a RolePolicy,
}

impl<'a> RoleRegistry<'a> {
    pub fn new(catalog: &'a RoleCatalog, policy: &'a RolePolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn check_policy(&self, config: &ActiveConfiguration, agent: AgentId, role: &str) -> PolicyDecision {
        let refused = |reason| PolicyDecision::Refused {
            agent,
            role: role.to_string(),
            reason,
        };

        if !config.includes(agent) {
            return refused(AssignmentReason::AgentNotInMode);
        }
        let Some(index) = config.active_index_of(agent) else {
            return refused(AssignmentReason::AgentNotInMode);
        };
        if !self.catalog.contains(role) {
            return refused(AssignmentReason::UnknownRole);
        }

        let others: Vec<ActiveIndex> = config
            .holders(role)
            .into_iter()
            .filter(|holder| *holder != index)
            .collect();

        let violation = |reason| PolicyDecision::Violation {
            agent,
            index,
            role: role.to_string(),
            reason,
        };

        if self.policy.is_unique(role) && !others.is_empty() {
            return violation(AssignmentReason::RoleUniqueConflict);
        }
        if let Some(cap) = self.policy.capacity_of(role) {
            if others.len() >= cap {
                return violation(AssignmentReason::RoleCapExceeded);
            }
        }

        PolicyDecision::Grant {
            agent,
            index,
            role: role.to_string(),
        }
    }

    pub fn apply(
        &self,
        config: &mut ActiveConfiguration,
        decision: PolicyDecision,
        handling: ViolationHandling,
    ) -> AssignmentOutcome {
        match decision {
            PolicyDecision::Grant { agent, index, role } => {
                config.assignments.insert(index, role.clone());
                AssignmentOutcome {
                    ok: true,
                    reason: AssignmentReason::Assigned,
                    agent,
                    requested: role.clone(),
                    current: Some(role),
                }
            }
            PolicyDecision::Violation {
                agent,
                index,
                role,
                reason,
            } => {
                if handling == ViolationHandling::AutoDemote {
                    config.assignments.insert(index, UNASSIGNED.to_string());
                }
                AssignmentOutcome {
                    ok: false,
                    reason,
                    agent,
                    requested: role,
                    current: config.assignments.get(&index).cloned(),
                }
            }
            PolicyDecision::Refused { agent, role, reason } => AssignmentOutcome {
                ok: false,
                reason,
                agent,
                requested: role,
                current: config.role_of(agent).map(str::to_string),
            },
        }
    }

    /// Check then apply in one step.
    pub fn assign(
        &self,
        config: &mut ActiveConfiguration,
        agent: AgentId,
        role: &str,
        handling: ViolationHandling,
    ) -> AssignmentOutcome {
        let decision = self.check_policy(config, agent, role);
        self.apply(config, decision, handling)
    }

    pub fn unassign(&self, config: &mut ActiveConfiguration, agent: AgentId) -> AssignmentOutcome {
        let index = config.active_index_of(agent).filter(|_| config.includes(agent));
        match index {
            Some(index) => {
                config.assignments.remove(&index);
                AssignmentOutcome {
                    ok: true,
                    reason: AssignmentReason::Unassigned,
                    agent,
                    requested: UNASSIGNED.to_string(),
                    current: None,
                }
            }
            None => AssignmentOutcome {
                ok: false,
                reason: AssignmentReason::AgentNotInMode,
                agent,
                requested: UNASSIGNED.to_string(),
                current: None,
            },
        }
    }
}

/// Role per active slot for a new mode, carried over from the previous
/// configuration by agent identity. Roles no longer in the catalog fall back to
/// [`UNASSIGNED`].
pub fn carry_assignments(
    previous: Option<&ActiveConfiguration>,
    mapping: &BTreeMap<AgentId, ActiveIndex>,
    catalog: &RoleCatalog,
) -> BTreeMap<ActiveIndex, String> {
    mapping
        .iter()
        .map(|(agent, index)| {
            let role = previous
                .and_then(|cfg| cfg.role_of(*agent))
                .filter(|role| *role != UNASSIGNED && catalog.contains(role))
                .unwrap_or(UNASSIGNED);
            (*index, role.to_string())
        })
        .collect()
}
