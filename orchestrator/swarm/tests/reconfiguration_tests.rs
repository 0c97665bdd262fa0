// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for mode switching, planning and rollback against a
//! temporary config/state tree.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swarmgov_core::application::RoleService;
use swarmgov_core::domain::audit::ValidatorResult;
use swarmgov_core::domain::coordinates::{AgentId, Position};
use swarmgov_core::domain::governance_config::GovernanceConfig;
use swarmgov_core::domain::mode::UNASSIGNED;
use swarmgov_core::GovernanceError;
use swarmgov_swarm::application::{ActivationExecutor, ReconfigurationManager, StatusProvider};
use swarmgov_swarm::{ForceScope, SwitchOptions};
use tempfile::TempDir;

// ── collaborators ───────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingActivator {
    activated: Mutex<Vec<AgentId>>,
    failing: BTreeSet<AgentId>,
}

#[async_trait]
impl ActivationExecutor for RecordingActivator {
    async fn activate(&self, agent: AgentId) -> bool {
        self.activated.lock().unwrap().push(agent);
        !self.failing.contains(&agent)
    }
}

#[derive(Default)]
struct StaticStatus {
    busy: BTreeSet<AgentId>,
    blockers: Vec<String>,
}

#[async_trait]
impl StatusProvider for StaticStatus {
    async fn is_busy(&self, agent: AgentId) -> bool {
        self.busy.contains(&agent)
    }

    async fn open_blockers(&self) -> Vec<String> {
        self.blockers.clone()
    }
}

/// Holds the switch lock for `delay` per busy check, then reports blockers.
struct SlowStatus {
    delay: Duration,
    blockers: Vec<String>,
}

#[async_trait]
impl StatusProvider for SlowStatus {
    async fn is_busy(&self, _agent: AgentId) -> bool {
        tokio::time::sleep(self.delay).await;
        false
    }

    async fn open_blockers(&self) -> Vec<String> {
        self.blockers.clone()
    }
}

// ── fixture ─────────────────────────────────────────────────────────────────

struct Fixture {
    _dir: TempDir,
    config: GovernanceConfig,
    signature: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GovernanceConfig::default();
        config.spec.paths.config_dir = dir.path().join("config");
        config.spec.paths.state_dir = dir.path().join("state");
        config.spec.lock.poll_interval_ms = 10;
        config.spec.lock.timeout_ms = 150;

        let config_dir = config.spec.paths.config_dir.clone();
        std::fs::create_dir_all(config_dir.join("modes")).unwrap();
        let canonical: BTreeMap<String, [i64; 2]> = (1..=8)
            .map(|id| (id.to_string(), [id * 100, id * 100]))
            .collect();
        std::fs::write(
            config_dir.join("canonical_coordinates.json"),
            serde_json::to_string(&canonical).unwrap(),
        )
        .unwrap();
        std::fs::write(
            config_dir.join("roles.json"),
            json!({
                "roles": {
                    "captain": {"description": "leads the swarm"},
                    "co_captain": {"description": "second in command"},
                    "builder": {"description": "implements changes"}
                }
            })
            .to_string(),
        )
        .unwrap();

        let signature = dir.path().join("intent.sig");
        std::fs::write(&signature, b"captain approves").unwrap();

        let fixture = Self {
            _dir: dir,
            config,
            signature,
        };
        fixture.preset(2, &[1, 2], &[(1, 1), (2, 2)]);
        fixture.preset(4, &[1, 2, 3, 4], &[(1, 1), (2, 2), (3, 3), (4, 4)]);
        fixture
    }

    fn preset(&self, mode: u8, include: &[u32], mapping: &[(u32, u32)]) {
        let mapping: BTreeMap<String, u32> = mapping.iter().map(|(a, i)| (a.to_string(), *i)).collect();
        std::fs::write(
            self.config.spec.paths.config_dir.join("modes").join(format!("mode_{mode}.json")),
            json!({"include": include, "mapping": mapping}).to_string(),
        )
        .unwrap();
    }

    fn state(&self, relative: &str) -> PathBuf {
        self.config.spec.paths.state_dir.join(relative)
    }

    fn manager(&self) -> ReconfigurationManager {
        self.manager_with(Arc::new(RecordingActivator::default()), StaticStatus::default())
    }

    fn manager_with(&self, activator: Arc<RecordingActivator>, status: StaticStatus) -> ReconfigurationManager {
        ReconfigurationManager::from_config(&self.config, activator, Arc::new(status))
    }

    fn options(&self, owner: &str) -> SwitchOptions {
        SwitchOptions::new(owner).with_signature(&self.signature)
    }

    fn audit_lines(&self) -> usize {
        std::fs::read_to_string(self.state("audit/mode_switch.jsonl"))
            .map(|body| body.lines().count())
            .unwrap_or(0)
    }

    fn read_opt(&self, relative: &str) -> Option<Vec<u8>> {
        std::fs::read(self.state(relative)).ok()
    }

    fn snapshot_names(&self) -> Vec<String> {
        match std::fs::read_dir(self.state("snapshots")) {
            Ok(entries) => {
                let mut names: Vec<String> = entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                    .collect();
                names.sort();
                names
            }
            Err(_) => Vec::new(),
        }
    }
}

// ── switch ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_four_agent_switch_commits_exact_coordinates() {
    let fx = Fixture::new();
    let activator = Arc::new(RecordingActivator::default());
    let manager = fx.manager_with(activator.clone(), StaticStatus::default());

    let outcome = manager.switch_mode(4, fx.options("captain")).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.from, None);
    assert_eq!(outcome.diff.activated, vec![1, 2, 3, 4]);
    assert_eq!(manager.current_mode().unwrap(), Some(4));

    let coords: serde_json::Value =
        serde_json::from_slice(&fx.read_opt("active_coordinates.json").unwrap()).unwrap();
    assert_eq!(
        coords,
        json!({"1": [100, 100], "2": [200, 200], "3": [300, 300], "4": [400, 400]})
    );

    assert_eq!(manager.history().unwrap().len(), 1);
    assert_eq!(fx.audit_lines(), 1);
    assert_eq!(fx.snapshot_names().len(), 1);
    assert_eq!(*activator.activated.lock().unwrap(), vec![1, 2, 3, 4]);

    let records = manager.stores().audit.records().unwrap();
    assert_eq!(records[0].validator, ValidatorResult::Ok);
    assert!(records[0].captain_sig.as_ref().is_some_and(|sig| sig.len() == 64));

    let (_, snapshot) = manager.stores().snapshots.latest().unwrap().unwrap();
    assert!(snapshot.active_roles.is_none());
    assert!(snapshot.ts <= outcome.committed_at);
}

#[tokio::test]
async fn test_each_switch_adds_one_history_audit_and_snapshot() {
    let fx = Fixture::new();
    let manager = fx.manager();

    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    let outcome = manager.switch_mode(4, fx.options("co_captain")).await.unwrap();

    assert_eq!(outcome.from, Some(2));
    assert_eq!(outcome.diff.activated, vec![3, 4]);
    assert!(outcome.diff.deactivated.is_empty());

    let history = manager.history().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!((history[1].from, history[1].to), (Some(2), 4));
    assert_eq!(history[1].owner, "co_captain");
    assert_eq!(fx.audit_lines(), 2);
    assert_eq!(fx.snapshot_names().len(), 2);

    let (_, snapshot) = manager.stores().snapshots.latest().unwrap().unwrap();
    assert_eq!(snapshot.configuration().map(|cfg| cfg.mode), Some(2));
    assert!(fx.state("config_changed.marker").exists());
}

#[tokio::test]
async fn test_size_mismatch_rejects_with_one_fail_audit_and_no_history() {
    let fx = Fixture::new();
    fx.preset(4, &[1, 2, 3], &[(1, 1), (2, 2), (3, 3)]);
    let manager = fx.manager();

    let err = manager.switch_mode(4, fx.options("captain")).await.unwrap_err();
    match &err {
        GovernanceError::Validation(report) => {
            assert!(!report.ok);
            assert!(report
                .errors
                .contains(&"projection_size_mismatch: include=3 expected=4".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }

    let records = manager.stores().audit.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].validator, ValidatorResult::Fail);
    assert!(manager.history().unwrap().is_empty());
    assert!(fx.read_opt("active_config.json").is_none());
    assert!(fx.snapshot_names().is_empty());
    assert_eq!(manager.stores().counters.load().unwrap().failure, 1);

    let stored = manager.stores().reports.load().unwrap().unwrap();
    assert!(!stored.report.ok);
}

#[tokio::test]
async fn test_unauthorized_owner_leaves_state_byte_identical() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();

    let config_before = fx.read_opt("active_config.json");
    let coords_before = fx.read_opt("active_coordinates.json");
    let history_before = fx.read_opt("mode_history.json");
    let snapshots_before = fx.snapshot_names();

    let err = manager.switch_mode(4, fx.options("worker-1")).await.unwrap_err();
    assert_eq!(err.kind(), "authority_error");

    assert_eq!(fx.read_opt("active_config.json"), config_before);
    assert_eq!(fx.read_opt("active_coordinates.json"), coords_before);
    assert_eq!(fx.read_opt("mode_history.json"), history_before);
    assert_eq!(fx.snapshot_names(), snapshots_before);

    let records = manager.stores().audit.records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].validator, ValidatorResult::Fail);
    assert_eq!(records[1].owner, "worker-1");
}

#[tokio::test]
async fn test_unsupported_target_is_rejected_even_when_forced() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let err = manager
        .switch_mode(3, fx.options("captain").with_force(ForceScope::Full))
        .await
        .unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidMode(3)));
    assert!(fx.read_opt("active_config.json").is_none());
}

#[tokio::test]
async fn test_missing_signature_fails_unless_fully_forced() {
    let fx = Fixture::new();
    let manager = fx.manager();

    let err = manager
        .switch_mode(2, SwitchOptions::new("captain"))
        .await
        .unwrap_err();
    match err {
        GovernanceError::Validation(report) => {
            assert_eq!(report.errors, vec!["missing_signed_intent".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = manager
        .switch_mode(2, SwitchOptions::new("captain").with_force(ForceScope::Operational))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");

    let outcome = manager
        .switch_mode(2, SwitchOptions::new("captain").with_force(ForceScope::Full))
        .await
        .unwrap();
    assert!(outcome.forced);
    assert!(!outcome.report.ok);

    let records = manager.stores().audit.records().unwrap();
    let last = records.last().unwrap();
    assert!(last.forced);
    assert!(last.captain_sig.is_none());
}

#[tokio::test]
async fn test_held_lock_times_out_unless_forced() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let _held = manager.stores().lock.try_acquire("co_captain").unwrap().unwrap();

    let err = manager.switch_mode(2, fx.options("captain")).await.unwrap_err();
    match err {
        GovernanceError::LockTimeout { holder, .. } => {
            assert_eq!(holder.unwrap().owner, "co_captain");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fx.read_opt("active_config.json").is_none());

    let outcome = manager
        .switch_mode(2, fx.options("captain").with_force(ForceScope::Operational))
        .await
        .unwrap();
    assert!(outcome.lock_bypassed);
    assert_eq!(manager.current_mode().unwrap(), Some(2));
    assert!(manager.stores().audit.records().unwrap().last().unwrap().lock_bypassed);
}

#[tokio::test]
async fn test_busy_agent_blocks_switch_unless_forced() {
    let fx = Fixture::new();
    let status = StaticStatus {
        busy: BTreeSet::from([3]),
        ..Default::default()
    };
    let manager = fx.manager_with(Arc::new(RecordingActivator::default()), status);

    let err = manager.switch_mode(4, fx.options("captain")).await.unwrap_err();
    assert!(matches!(err, GovernanceError::ActiveOperations(ref agents) if agents == &vec![3]));
    assert!(manager.history().unwrap().is_empty());
    assert_eq!(fx.audit_lines(), 1);

    let outcome = manager
        .switch_mode(4, fx.options("captain").with_force(ForceScope::Operational))
        .await
        .unwrap();
    assert!(outcome.report.ok);
    assert_eq!(manager.current_mode().unwrap(), Some(4));
}

#[tokio::test]
async fn test_open_blockers_fail_validation() {
    let fx = Fixture::new();
    let status = StaticStatus {
        blockers: vec!["incident open".into()],
        ..Default::default()
    };
    let manager = fx.manager_with(Arc::new(RecordingActivator::default()), status);
    let err = manager.switch_mode(2, fx.options("captain")).await.unwrap_err();
    match err {
        GovernanceError::Validation(report) => assert!(report.has_error("open_blockers_present")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_out_of_bounds_canonical_position_fails_validation() {
    let fx = Fixture::new();
    let canonical = json!({"1": [100, 100], "2": [5000, 100]});
    std::fs::write(
        fx.config.spec.paths.config_dir.join("canonical_coordinates.json"),
        canonical.to_string(),
    )
    .unwrap();
    let manager = fx.manager();

    let err = manager.switch_mode(2, fx.options("captain")).await.unwrap_err();
    match err {
        GovernanceError::Validation(report) => {
            assert!(report.has_error("coordinate_out_of_bounds_for_slot_2"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_activation_failure_is_reported_but_committed() {
    let fx = Fixture::new();
    let activator = Arc::new(RecordingActivator {
        failing: BTreeSet::from([2]),
        ..Default::default()
    });
    let manager = fx.manager_with(activator, StaticStatus::default());

    let outcome = manager.switch_mode(2, fx.options("captain")).await.unwrap();
    assert_eq!(outcome.activation_failures, vec![2]);
    assert_eq!(manager.current_mode().unwrap(), Some(2));
}

#[tokio::test]
async fn test_roles_follow_agents_across_switch() {
    let fx = Fixture::new();
    fx.preset(2, &[3, 4], &[(3, 1), (4, 2)]);
    fx.preset(4, &[1, 2, 3, 4], &[(4, 1), (3, 2), (1, 3), (2, 4)]);
    let manager = fx.manager();
    let roles = RoleService::from_config(&fx.config);

    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    assert!(roles.assign_role(4, "captain", None).await.unwrap().ok);

    manager.switch_mode(4, fx.options("captain")).await.unwrap();
    let config = manager.stores().active.load().unwrap().unwrap();
    assert_eq!(config.role_of(4), Some("captain"));
    assert_eq!(config.assignments.get(&1).map(String::as_str), Some("captain"));
    assert_eq!(config.role_of(1), Some(UNASSIGNED));
    assert_eq!(config.coordinates.get(&1), Some(&Position::new(400, 400)));
}

#[tokio::test]
async fn test_snapshot_retention_prunes_oldest() {
    let mut fx = Fixture::new();
    fx.config.spec.snapshots.retention = Some(2);
    let manager = fx.manager();

    for mode in [2, 4, 2, 4] {
        manager.switch_mode(mode, fx.options("captain")).await.unwrap();
    }
    assert_eq!(fx.snapshot_names().len(), 2);
}

#[tokio::test]
async fn test_failed_switch_is_recorded_before_lock_release() {
    let fx = Fixture::new();
    let status = SlowStatus {
        delay: Duration::from_millis(20),
        blockers: vec!["incident open".into()],
    };
    let manager = ReconfigurationManager::from_config(
        &fx.config,
        Arc::new(RecordingActivator::default()),
        Arc::new(status),
    );
    let stores = manager.stores().clone();

    let waiter = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let guard = stores.lock.acquire("co_captain").await.unwrap();
        let seen = (stores.counters.load().unwrap(), fx.audit_lines());
        guard.release().unwrap();
        seen
    };
    let (result, (counters, audit_lines)) =
        tokio::join!(manager.switch_mode(2, fx.options("captain")), waiter);

    assert!(matches!(result, Err(GovernanceError::Validation(_))));
    assert_eq!((counters.success, counters.failure), (0, 1));
    assert_eq!(audit_lines, 1);
}

#[tokio::test]
async fn test_missing_role_catalog_fails_switch() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    std::fs::remove_file(fx.config.spec.paths.config_dir.join("roles.json")).unwrap();

    let err = manager.switch_mode(4, fx.options("captain")).await.unwrap_err();
    assert_eq!(err.kind(), "config_error");
    assert_eq!(manager.current_mode().unwrap(), Some(2));
    assert_eq!(manager.status().unwrap().counters.failure, 1);
    assert_eq!(fx.audit_lines(), 2);
}

#[tokio::test]
async fn test_unreadable_state_does_not_mask_owner_check() {
    let fx = Fixture::new();
    std::fs::create_dir_all(fx.state("")).unwrap();
    std::fs::write(fx.state("active_config.json"), b"{not json").unwrap();
    let manager = fx.manager();

    let err = manager.switch_mode(2, fx.options("worker-1")).await.unwrap_err();
    assert_eq!(err.kind(), "authority_error");
    assert_eq!(fx.audit_lines(), 1);
    let record = manager.stores().audit.records().unwrap().pop().unwrap();
    assert_eq!(record.from, None);
}

// ── plan ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_plan_is_read_only() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    let audit_before = fx.audit_lines();
    let config_before = fx.read_opt("active_config.json");

    let plan = manager.plan_mode(4).unwrap();
    assert_eq!(plan.current, Some(2));
    assert_eq!(plan.diff.activated, vec![3, 4]);
    assert!(plan.is_applicable());
    assert_eq!(plan.coordinates.get(&4), Some(&Position::new(400, 400)));

    assert_eq!(fx.audit_lines(), audit_before);
    assert_eq!(fx.read_opt("active_config.json"), config_before);
    assert!(manager.stores().lock.holder().unwrap().is_none());
}

#[tokio::test]
async fn test_plan_reports_mismatch_without_failing() {
    let fx = Fixture::new();
    fx.preset(4, &[1, 2, 3], &[(1, 1), (2, 2), (3, 3)]);
    let plan = fx.manager().plan_mode(4).unwrap();
    assert!(!plan.is_applicable());
    assert!(plan.report.has_error("projection_size_mismatch"));
    assert_eq!(fx.manager().plan_mode(7).unwrap_err().kind(), "invalid_mode_error");
}

// ── rollback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rollback_without_snapshot_fails_and_mutates_nothing() {
    let fx = Fixture::new();
    let manager = fx.manager();

    let err = manager.rollback_mode("captain").await.unwrap_err();
    assert!(matches!(err, GovernanceError::NoSnapshot));
    assert!(fx.read_opt("active_config.json").is_none());
    assert!(fx.read_opt("mode_history.json").is_none());
    assert_eq!(fx.audit_lines(), 0);
    assert!(!fx.state("config_changed.marker").exists());
}

#[tokio::test]
async fn test_rollback_restores_latest_snapshot_exactly() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    RoleService::from_config(&fx.config)
        .assign_role(1, "builder", None)
        .await
        .unwrap();
    manager.switch_mode(4, fx.options("captain")).await.unwrap();

    let (_, snapshot) = manager.stores().snapshots.latest().unwrap().unwrap();
    let outcome = manager.rollback_mode("co_captain").await.unwrap();
    assert_eq!((outcome.from, outcome.restored), (Some(4), Some(2)));

    let restored = manager.stores().active.load().unwrap();
    assert_eq!(restored, snapshot.configuration());
    assert_eq!(restored.unwrap().role_of(1), Some("builder"));

    let records = manager.stores().audit.records().unwrap();
    let last = records.last().unwrap();
    assert_eq!(last.diff.deactivated, vec![3, 4]);
    assert_eq!(manager.history().unwrap().last().unwrap().to, 2);
}

#[tokio::test]
async fn test_rollback_past_first_switch_clears_configuration() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();

    let outcome = manager.rollback_mode("captain").await.unwrap();
    assert_eq!(outcome.restored, None);
    assert!(manager.current_mode().unwrap().is_none());
    assert!(fx.read_opt("active_coordinates.json").is_none());
}

#[tokio::test]
async fn test_rollback_requires_authority() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    let err = manager.rollback_mode("worker-1").await.unwrap_err();
    assert_eq!(err.kind(), "authority_error");
    assert_eq!(manager.current_mode().unwrap(), Some(2));
}

#[tokio::test]
async fn test_rollback_waits_for_switch_lock() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    let before = fx.read_opt("active_config.json");
    let held = manager.stores().lock.try_acquire("co_captain").unwrap().unwrap();

    let err = manager.rollback_mode("captain").await.unwrap_err();
    assert_eq!(err.kind(), "lock_timeout_error");
    assert_eq!(fx.read_opt("active_config.json"), before);
    assert_eq!(manager.current_mode().unwrap(), Some(2));

    held.release().unwrap();
    manager.rollback_mode("captain").await.unwrap();
    assert!(manager.current_mode().unwrap().is_none());
}

// ── status ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_summarizes_engine_state() {
    let fx = Fixture::new();
    let manager = fx.manager();
    manager.switch_mode(2, fx.options("captain")).await.unwrap();
    let _ = manager.switch_mode(4, SwitchOptions::new("captain")).await;

    let status = manager.status().unwrap();
    assert_eq!(status.mode, Some(2));
    assert_eq!(status.include, vec![1, 2]);
    assert_eq!((status.counters.success, status.counters.failure), (1, 1));
    assert_eq!(status.snapshots, 1);
    assert!(status.lock_holder.is_none());
    assert!(status.last_change.is_some());
    assert!(!status.last_report.unwrap().ok);
}
