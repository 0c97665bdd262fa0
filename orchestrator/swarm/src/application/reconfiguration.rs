// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Reconfiguration Manager
//!
//! Orchestrates a mode switch end to end:
//!
//! 1. owner and target checks (never bypassed)
//! 2. switch lock, bounded wait
//! 3. busy-agent gate over the current and target agent sets
//! 4. projection, request and canvas validation; report persisted
//! 5. snapshot → activate new agents → persist → history → marker → audit
//! 6. lock released on every path
//!
//! Every attempt leaves exactly one audit record. A rejected switch persists
//! nothing else apart from the validation report and the failure counter.

use crate::application::{ActivationExecutor, StatusProvider};
use crate::domain::{
    EngineStatus, ModePlan, RollbackOutcome, SwitchOptions, SwitchOutcome, SwitchPhase,
};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use swarmgov_core::domain::audit::{AuditAction, AuditRecord, ModeHistoryEntry};
use swarmgov_core::domain::coordinates::{project_coordinates, AgentId};
use swarmgov_core::domain::governance_config::GovernanceConfig;
use swarmgov_core::domain::mode::{is_supported_mode, ActiveConfiguration, Authority, ModeDiff};
use swarmgov_core::domain::roles::{carry_assignments, RolePolicy};
use swarmgov_core::domain::validation::{
    validate_projection, validate_switch_request, ProposedProjection, RuntimeState, SwitchRequest,
    ValidationReport,
};
use swarmgov_core::domain::GovernanceError;
use swarmgov_core::infrastructure::{signature, GovernanceStores, LockGuard};
use tracing::{debug, info, warn};

pub struct ReconfigurationManager {
    stores: GovernanceStores,
    policy: RolePolicy,
    retention: Option<usize>,
    activator: Arc<dyn ActivationExecutor>,
    status: Arc<dyn StatusProvider>,
}

/// Facts gathered while a switch progresses, used for the audit record
/// whichever way the switch ends.
struct Attempt {
    phase: SwitchPhase,
    record: AuditRecord,
}

impl Attempt {
    fn advance(&mut self, next: SwitchPhase) {
        if !self.phase.can_transition_to(next) {
            warn!("Unexpected switch phase transition {} -> {}", self.phase, next);
        }
        debug!("Switch phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}

impl ReconfigurationManager {
    pub fn new(
        stores: GovernanceStores,
        policy: RolePolicy,
        retention: Option<usize>,
        activator: Arc<dyn ActivationExecutor>,
        status: Arc<dyn StatusProvider>,
    ) -> Self {
        Self {
            stores,
            policy,
            retention,
            activator,
            status,
        }
    }

    pub fn from_config(
        config: &GovernanceConfig,
        activator: Arc<dyn ActivationExecutor>,
        status: Arc<dyn StatusProvider>,
    ) -> Self {
        Self::new(
            GovernanceStores::from_config(config),
            config.spec.roles.policy.clone(),
            config.spec.snapshots.retention,
            activator,
            status,
        )
    }

    pub fn stores(&self) -> &GovernanceStores {
        &self.stores
    }

    pub fn current_mode(&self) -> Result<Option<u8>, GovernanceError> {
        self.stores.active.current_mode()
    }

    pub fn history(&self) -> Result<Vec<ModeHistoryEntry>, GovernanceError> {
        self.stores.mode_history.entries()
    }

    pub fn status(&self) -> Result<EngineStatus, GovernanceError> {
        let active = self.stores.active.load()?;
        let lock_holder = self.stores.lock.holder()?;
        let lock_stale = lock_holder
            .as_ref()
            .is_some_and(|record| record.is_expired_at(Utc::now()));
        Ok(EngineStatus {
            mode: active.as_ref().map(|cfg| cfg.mode),
            include: active.map(|cfg| cfg.include).unwrap_or_default(),
            lock_holder,
            lock_stale,
            counters: self.stores.counters.load()?,
            snapshots: self.stores.snapshots.list()?.len(),
            last_change: self.stores.marker.read()?,
            last_report: self.stores.reports.load()?.map(|stored| stored.report),
        })
    }

    /// Preview a switch. Takes no lock and writes nothing.
    pub fn plan_mode(&self, target: u8) -> Result<ModePlan, GovernanceError> {
        if !is_supported_mode(target) {
            return Err(GovernanceError::InvalidMode(target));
        }
        let preset = self.stores.catalog.load_preset(target)?;
        let canonical = self.stores.coordinates.load_canonical()?;
        let current = self.stores.active.load()?;
        let catalog = self.stores.catalog.require_roles()?;

        let (coordinates, _) = project_coordinates(&canonical, &preset.mapping);
        let coordinate_check = self.stores.coordinates.canvas().check(&coordinates);

        let assignments = carry_assignments(current.as_ref(), &preset.mapping, &catalog);
        let proposed = ProposedProjection::from_preset(&preset, Some(assignments));
        let report = validate_projection(&canonical, &proposed, &self.policy.unique_roles)
            .merged(ValidationReport::from_coordinates(&coordinate_check));

        let current_include = current.as_ref().map(|cfg| cfg.include.clone()).unwrap_or_default();
        Ok(ModePlan {
            target,
            current: current.map(|cfg| cfg.mode),
            diff: ModeDiff::between(&current_include, &preset.include),
            coordinates,
            coordinate_check,
            report,
        })
    }

    pub async fn switch_mode(&self, target: u8, options: SwitchOptions) -> Result<SwitchOutcome, GovernanceError> {
        // Unreadable state must not mask step 1; the locked path reloads it.
        let from = self.current_mode().unwrap_or_else(|err| {
            warn!("Current mode unreadable before switch: {}", err);
            None
        });
        let mut attempt = Attempt {
            phase: SwitchPhase::Idle,
            record: AuditRecord::new(AuditAction::Switch, from, Some(target), &options.owner),
        };
        attempt.record.forced = options.force.is_forced();

        // Step 1: never bypassed, no lock taken.
        let early = if !is_supported_mode(target) {
            Some(GovernanceError::InvalidMode(target))
        } else if Authority::parse(&options.owner).is_none() {
            Some(GovernanceError::Authority(options.owner.clone()))
        } else {
            None
        };
        if let Some(err) = early {
            attempt.advance(SwitchPhase::Rejected);
            warn!(target, owner = %options.owner, "Switch rejected: {}", err);
            self.stores.audit.append(&attempt.record.failed(err.kind()))?;
            metrics::counter!("swarmgov_mode_switch_rejected_total", "reason" => err.kind()).increment(1);
            return Err(err);
        }

        // Step 2
        let mut guard = match self.stores.lock.acquire(&options.owner).await {
            Ok(guard) => {
                attempt.advance(SwitchPhase::LockHeld);
                Some(guard)
            }
            Err(err @ GovernanceError::LockTimeout { .. }) if options.force.bypasses_lock_timeout() => {
                warn!("Forced switch proceeding without the switch lock: {}", err);
                attempt.record.lock_bypassed = true;
                None
            }
            Err(err) => {
                attempt.advance(SwitchPhase::Rejected);
                warn!(target, "Switch rejected: {}", err);
                self.stores.audit.append(&attempt.record.failed(err.to_string()))?;
                return Err(err);
            }
        };

        // The failure audit and counter are written before the guard goes.
        let result = self.switch_locked(target, &options, &mut guard, &mut attempt).await;
        if let Err(err) = &result {
            if attempt.phase != SwitchPhase::Rejected {
                attempt.advance(SwitchPhase::Rejected);
            }
            warn!(target, owner = %options.owner, "Switch rejected: {}", err);
            let reason = match err {
                GovernanceError::Validation(report) => report.errors.join(", "),
                other => other.to_string(),
            };
            self.stores.audit.append(&attempt.record.clone().failed(reason))?;
            self.stores.counters.record(false)?;
        }
        if let Some(guard) = guard {
            guard.release()?;
        }
        result
    }

    /// Steps 3 to 5. The caller releases the guard.
    async fn switch_locked(
        &self,
        target: u8,
        options: &SwitchOptions,
        guard: &mut Option<LockGuard>,
        attempt: &mut Attempt,
    ) -> Result<SwitchOutcome, GovernanceError> {
        let current = self.stores.active.load()?;
        let from = current.as_ref().map(|cfg| cfg.mode);
        attempt.record.from = from;
        let preset = self.stores.catalog.load_preset(target)?;
        let current_include = current.as_ref().map(|cfg| cfg.include.clone()).unwrap_or_default();
        let diff = ModeDiff::between(&current_include, &preset.include);
        attempt.record.diff = diff.clone();

        // Step 3
        let candidates: BTreeSet<AgentId> = current_include
            .iter()
            .chain(preset.include.iter())
            .copied()
            .collect();
        let mut busy = Vec::new();
        for agent in candidates {
            if self.status.is_busy(agent).await {
                busy.push(agent);
            }
        }
        if !busy.is_empty() {
            if !options.force.bypasses_busy_check() {
                return Err(GovernanceError::ActiveOperations(busy));
            }
            warn!("Forced switch ignoring busy agents {:?}", busy);
            busy.clear();
        }
        let runtime = RuntimeState {
            running_agents: busy,
            blockers: self.status.open_blockers().await,
        };

        // Step 4
        attempt.advance(SwitchPhase::Validating);
        let canonical = self.stores.coordinates.load_canonical()?;
        let catalog = self.stores.catalog.require_roles()?;
        let assignments = carry_assignments(current.as_ref(), &preset.mapping, &catalog);
        let proposed = ProposedProjection::from_preset(&preset, Some(assignments.clone()));
        let request = SwitchRequest {
            owner: options.owner.clone(),
            target_mode: target,
            signature_path: options.signature_path.clone(),
        };
        let (coordinates, _) = project_coordinates(&canonical, &preset.mapping);
        let canvas_report =
            ValidationReport::from_coordinates(&self.stores.coordinates.canvas().check(&coordinates));

        let report = validate_projection(&canonical, &proposed, &self.policy.unique_roles)
            .merged(validate_switch_request(&request, &runtime))
            .merged(canvas_report);
        self.stores.reports.save(&report)?;

        if !report.ok {
            if !options.force.bypasses_validators() {
                return Err(GovernanceError::Validation(report));
            }
            warn!("Forced switch overriding failed validation: {}", report.errors.join(", "));
        }

        attempt.record.captain_sig = match &options.signature_path {
            Some(path) => signature::digest_file(path)?,
            None => None,
        };

        // Step 5
        attempt.advance(SwitchPhase::Applying);
        let snapshot = self.stores.snapshots.save(current.as_ref())?;
        if let Some(retention) = self.retention {
            self.stores.snapshots.prune(retention)?;
        }
        renew(guard)?;

        let mut activation_failures = Vec::new();
        for agent in &diff.activated {
            if !self.activator.activate(*agent).await {
                warn!(agent, "Activation failed for newly included agent");
                activation_failures.push(*agent);
            }
        }
        renew(guard)?;

        let config = ActiveConfiguration {
            mode: target,
            include: preset.include.clone(),
            mapping: preset.mapping.clone(),
            roles: catalog.names(),
            assignments,
            coordinates,
        };
        self.stores.active.save(&config)?;
        self.stores.mode_history.append(ModeHistoryEntry {
            from,
            to: target,
            owner: options.owner.clone(),
            timestamp: Utc::now(),
        })?;
        let committed_at = self.stores.marker.touch()?;
        self.stores.audit.append(&attempt.record)?;
        self.stores.counters.record(true)?;
        attempt.advance(SwitchPhase::Committed);

        info!(
            from = ?from,
            to = target,
            owner = %options.owner,
            activated = ?diff.activated,
            deactivated = ?diff.deactivated,
            "Mode switch committed"
        );

        Ok(SwitchOutcome {
            success: true,
            from,
            to: target,
            diff,
            report,
            snapshot,
            activation_failures,
            forced: options.force.is_forced(),
            lock_bypassed: attempt.record.lock_bypassed,
            committed_at,
        })
    }

    /// Restore the most recent snapshot exactly. The snapshot is kept, so a
    /// repeated rollback restores the same state.
    pub async fn rollback_mode(&self, owner: &str) -> Result<RollbackOutcome, GovernanceError> {
        if Authority::parse(owner).is_none() {
            return Err(GovernanceError::Authority(owner.to_string()));
        }
        let guard = self.stores.lock.acquire(owner).await?;

        let Some((path, snapshot)) = self.stores.snapshots.latest()? else {
            warn!("Rollback requested but no snapshot exists");
            return Err(GovernanceError::NoSnapshot);
        };

        let previous = self.stores.active.load()?;
        let from = previous.as_ref().map(|cfg| cfg.mode);
        let previous_include = previous.map(|cfg| cfg.include).unwrap_or_default();

        let restored = snapshot.configuration();
        match &restored {
            Some(config) => self.stores.active.save(config)?,
            None => self.stores.active.clear()?,
        }
        let restored_mode = restored.as_ref().map(|cfg| cfg.mode);
        if let Some(to) = restored_mode {
            self.stores.mode_history.append(ModeHistoryEntry {
                from,
                to,
                owner: owner.to_string(),
                timestamp: Utc::now(),
            })?;
        }
        self.stores.marker.touch()?;

        let restored_include = restored.map(|cfg| cfg.include).unwrap_or_default();
        let record = AuditRecord::new(AuditAction::Rollback, from, restored_mode, owner)
            .with_diff(ModeDiff::between(&previous_include, &restored_include));
        self.stores.audit.append(&record)?;
        metrics::counter!("swarmgov_rollbacks_total").increment(1);
        guard.release()?;

        info!(from = ?from, to = ?restored_mode, snapshot = %path.display(), "Rollback applied");
        Ok(RollbackOutcome {
            success: true,
            from,
            restored: restored_mode,
            snapshot: path,
        })
    }
}

fn renew(guard: &mut Option<LockGuard>) -> Result<(), GovernanceError> {
    match guard {
        Some(guard) => guard.renew(),
        None => Ok(()),
    }
}
