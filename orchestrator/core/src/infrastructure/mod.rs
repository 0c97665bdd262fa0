// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Infrastructure Layer
//!
//! File-backed persistence for every governance artifact. All JSON documents
//! are replaced atomically (see [`json_file`]); the audit ledger is appended
//! under a file lock.
//!
//! | Module | Artifact |
//! |--------|----------|
//! | [`coordinate_store`] | canonical and active coordinate tables |
//! | [`config_catalog`] | mode presets, role catalog |
//! | [`active_store`] | active configuration, change marker |
//! | [`history_store`] | mode and role histories |
//! | [`audit_ledger`] | `audit/mode_switch.jsonl` |
//! | [`snapshot_store`] | pre-change snapshots |
//! | [`report_store`] | last validation report |
//! | [`counters`] | switch success/failure counters |
//! | [`signature`] | signed-intent digest |
//! | [`switch_lock`] | `locks/reconfigure.lock` |

pub mod active_store;
pub mod audit_ledger;
pub mod config_catalog;
pub mod coordinate_store;
pub mod counters;
pub mod history_store;
pub mod json_file;
pub mod layout;
pub mod report_store;
pub mod signature;
pub mod snapshot_store;
pub mod switch_lock;

pub use active_store::{ActiveConfigStore, ChangeMarker};
pub use audit_ledger::AuditLedger;
pub use config_catalog::ConfigCatalog;
pub use coordinate_store::CoordinateStore;
pub use counters::SwitchCounterStore;
pub use history_store::{ModeHistoryStore, RoleHistoryStore};
pub use layout::StateLayout;
pub use report_store::{ReportStore, StoredReport};
pub use snapshot_store::SnapshotStore;
pub use switch_lock::{LockGuard, SwitchLock};

use crate::domain::governance_config::GovernanceConfig;

/// Every store over one [`StateLayout`], plus the switch lock guarding them.
#[derive(Debug, Clone)]
pub struct GovernanceStores {
    pub layout: StateLayout,
    pub coordinates: CoordinateStore,
    pub catalog: ConfigCatalog,
    pub active: ActiveConfigStore,
    pub marker: ChangeMarker,
    pub mode_history: ModeHistoryStore,
    pub role_history: RoleHistoryStore,
    pub audit: AuditLedger,
    pub snapshots: SnapshotStore,
    pub reports: ReportStore,
    pub counters: SwitchCounterStore,
    pub lock: SwitchLock,
}

impl GovernanceStores {
    pub fn from_config(config: &GovernanceConfig) -> Self {
        let layout = StateLayout::from_config(config);
        Self {
            coordinates: CoordinateStore::new(layout.clone(), config.spec.canvas),
            catalog: ConfigCatalog::new(layout.clone()),
            active: ActiveConfigStore::new(layout.clone()),
            marker: ChangeMarker::new(layout.clone()),
            mode_history: ModeHistoryStore::new(layout.clone()),
            role_history: RoleHistoryStore::new(layout.clone()),
            audit: AuditLedger::new(layout.clone()),
            snapshots: SnapshotStore::new(layout.clone()),
            reports: ReportStore::new(layout.clone()),
            counters: SwitchCounterStore::new(layout.clone()),
            lock: SwitchLock::new(&layout, &config.spec.lock),
            layout,
        }
    }
}
