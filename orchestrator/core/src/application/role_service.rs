// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Role Service
//!
//! Persistent role assignment on top of [`RoleRegistry`]. Every mutation runs
//! under the switch lock so it cannot interleave with a mode switch or a
//! rollback, and every attempt appends one event to the role history.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements `role assign`, `role unassign`, `role list`

use crate::domain::coordinates::{ActiveIndex, AgentId};
use crate::domain::governance_config::GovernanceConfig;
use crate::domain::mode::UNASSIGNED;
use crate::domain::roles::{
    AssignmentOutcome, AssignmentReason, RoleCatalog, RoleHistoryEvent, RolePolicy, RoleRegistry,
    ViolationHandling,
};
use crate::domain::GovernanceError;
use crate::infrastructure::GovernanceStores;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Lock owner recorded while a role mutation holds the switch lock.
const LOCK_OWNER: &str = "role_registry";

/// One row of `role list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub agent: AgentId,
    pub index: ActiveIndex,
    pub role: String,
}

pub struct RoleService {
    stores: GovernanceStores,
    policy: RolePolicy,
    handling: ViolationHandling,
}

impl RoleService {
    pub fn new(stores: GovernanceStores, policy: RolePolicy, handling: ViolationHandling) -> Self {
        Self {
            stores,
            policy,
            handling,
        }
    }

    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self::new(
            GovernanceStores::from_config(config),
            config.spec.roles.policy.clone(),
            config.spec.roles.violation_handling,
        )
    }

    pub fn catalog(&self) -> Result<RoleCatalog, GovernanceError> {
        self.stores.catalog.load_roles()
    }

    /// Assign `role` to `agent`. Policy violations come back as a failed
    /// outcome under [`ViolationHandling::AutoDemote`] and as
    /// [`GovernanceError::RolePolicyViolation`] under [`ViolationHandling::Reject`].
    pub async fn assign_role(
        &self,
        agent: AgentId,
        role: &str,
        handling: Option<ViolationHandling>,
    ) -> Result<AssignmentOutcome, GovernanceError> {
        let handling = handling.unwrap_or(self.handling);
        let guard = self.stores.lock.acquire(LOCK_OWNER).await?;

        let catalog = self.stores.catalog.load_roles()?;
        let registry = RoleRegistry::new(&catalog, &self.policy);

        let outcome = match self.stores.active.load()? {
            Some(mut config) => {
                let before = config.assignments.clone();
                let decision = registry.check_policy(&config, agent, role);
                let outcome = registry.apply(&mut config, decision, handling);
                if config.assignments != before {
                    self.stores.active.save(&config)?;
                }
                outcome
            }
            None => AssignmentOutcome {
                ok: false,
                reason: AssignmentReason::AgentNotInMode,
                agent,
                requested: role.to_string(),
                current: None,
            },
        };

        self.record(&outcome)?;
        guard.release()?;

        if handling == ViolationHandling::Reject && outcome.reason.is_policy_violation() {
            return Err(GovernanceError::RolePolicyViolation(format!(
                "{}: agent {} cannot take role '{}'",
                outcome.reason, agent, role
            )));
        }
        Ok(outcome)
    }

    pub async fn unassign_role(&self, agent: AgentId) -> Result<AssignmentOutcome, GovernanceError> {
        let guard = self.stores.lock.acquire(LOCK_OWNER).await?;

        let catalog = self.stores.catalog.load_roles()?;
        let registry = RoleRegistry::new(&catalog, &self.policy);

        let outcome = match self.stores.active.load()? {
            Some(mut config) => {
                let outcome = registry.unassign(&mut config, agent);
                if outcome.ok {
                    self.stores.active.save(&config)?;
                }
                outcome
            }
            None => AssignmentOutcome {
                ok: false,
                reason: AssignmentReason::AgentNotInMode,
                agent,
                requested: UNASSIGNED.to_string(),
                current: None,
            },
        };

        self.record(&outcome)?;
        guard.release()?;
        Ok(outcome)
    }

    /// Role per active slot, in slot order. Slots without an entry read as
    /// `unassigned`.
    pub fn list_assignments(&self) -> Result<Vec<SlotAssignment>, GovernanceError> {
        let Some(config) = self.stores.active.load()? else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<SlotAssignment> = config
            .mapping
            .iter()
            .filter(|(agent, _)| config.includes(**agent))
            .map(|(agent, index)| SlotAssignment {
                agent: *agent,
                index: *index,
                role: config
                    .assignments
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| UNASSIGNED.to_string()),
            })
            .collect();
        rows.sort_by_key(|row| row.index);
        Ok(rows)
    }

    pub fn get_role(&self, agent: AgentId) -> Result<Option<String>, GovernanceError> {
        Ok(self
            .stores
            .active
            .load()?
            .and_then(|config| config.role_of(agent).map(str::to_string)))
    }

    fn record(&self, outcome: &AssignmentOutcome) -> Result<(), GovernanceError> {
        self.stores
            .role_history
            .append(RoleHistoryEvent::from_outcome(outcome))?;
        metrics::counter!("swarmgov_role_assignments_total", "result" => outcome.reason.as_str()).increment(1);

        if outcome.ok {
            info!(agent = outcome.agent, role = %outcome.requested, "Role {}", outcome.reason);
        } else {
            warn!(
                agent = outcome.agent,
                role = %outcome.requested,
                current = ?outcome.current,
                "Role assignment refused: {}",
                outcome.reason
            );
        }
        Ok(())
    }
}
