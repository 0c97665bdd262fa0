// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Audit & Recovery Records
//!
//! Value objects persisted by the audit ledger, the mode history and the
//! snapshot store. All are write-once: records are appended, snapshots are
//! never rewritten.

use crate::domain::coordinates::ActiveCoordinates;
use crate::domain::mode::{ActiveConfiguration, ModeDiff};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Switch,
    Rollback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorResult {
    Ok,
    Fail,
}

/// One line of the audit ledger; one per reconfiguration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub ts: DateTime<Utc>,
    pub action: AuditAction,
    pub from: Option<u8>,
    pub to: Option<u8>,
    pub owner: String,
    /// SHA-256 of the signed intent file, hex encoded.
    #[serde(default)]
    pub captain_sig: Option<String>,
    pub validator: ValidatorResult,
    #[serde(default)]
    pub diff: ModeDiff,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forced: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub lock_bypassed: bool,
}

impl AuditRecord {
    pub fn new(action: AuditAction, from: Option<u8>, to: Option<u8>, owner: &str) -> Self {
        Self {
            ts: Utc::now(),
            action,
            from,
            to,
            owner: owner.to_string(),
            captain_sig: None,
            validator: ValidatorResult::Ok,
            diff: ModeDiff::default(),
            reason: None,
            forced: false,
            lock_bypassed: false,
        }
    }

    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.validator = ValidatorResult::Fail;
        self.reason = Some(reason.into());
        self
    }

    pub fn with_diff(mut self, diff: ModeDiff) -> Self {
        self.diff = diff;
        self
    }

    pub fn with_signature(mut self, digest: Option<String>) -> Self {
        self.captain_sig = digest;
        self
    }
}

/// Entry of the append-style mode history array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeHistoryEntry {
    pub from: Option<u8>,
    pub to: u8,
    pub owner: String,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time copy of the active configuration.
///
/// `active_roles` is `None` when the snapshot was taken before any mode had
/// ever been applied; restoring it returns the engine to the unconfigured state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ts: DateTime<Utc>,
    pub active_roles: Option<ActiveConfiguration>,
    #[serde(default)]
    pub active_coordinates: ActiveCoordinates,
}

impl Snapshot {
    pub fn capture(config: Option<&ActiveConfiguration>) -> Self {
        Self {
            ts: Utc::now(),
            active_roles: config.cloned(),
            active_coordinates: config.map(|c| c.coordinates.clone()).unwrap_or_default(),
        }
    }

    /// The stored configuration with its coordinates re-attached.
    pub fn configuration(&self) -> Option<ActiveConfiguration> {
        self.active_roles.clone().map(|mut cfg| {
            cfg.coordinates = self.active_coordinates.clone();
            cfg
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCounters {
    pub success: u64,
    pub failure: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coordinates::Position;
    use std::collections::BTreeMap;

    #[test]
    fn test_audit_record_wire_format() {
        let record = AuditRecord::new(AuditAction::Switch, Some(2), Some(4), "captain")
            .with_diff(ModeDiff {
                activated: vec![3, 4],
                deactivated: vec![],
            })
            .failed("projection_size_mismatch: include=3 expected=4");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["validator"], "fail");
        assert_eq!(json["action"], "switch");
        assert_eq!(json["from"], 2);
        assert_eq!(json["diff"]["activated"], serde_json::json!([3, 4]));
        assert!(json.get("forced").is_none());
        assert!(json["captain_sig"].is_null());
    }

    #[test]
    fn test_snapshot_reattaches_coordinates() {
        let cfg = ActiveConfiguration {
            mode: 2,
            include: vec![1, 2],
            mapping: BTreeMap::from([(1, 1), (2, 2)]),
            roles: vec![],
            assignments: BTreeMap::new(),
            coordinates: BTreeMap::from([(1, Position::new(1, 1)), (2, Position::new(2, 2))]),
        };
        let snapshot = Snapshot::capture(Some(&cfg));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.configuration(), Some(cfg));
        assert_eq!(Snapshot::capture(None).configuration(), None);
    }
}
