// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Reconfiguration Domain
//!
//! Value types describing one mode switch: its lifecycle phases, how far a
//! forced switch may go, and the results handed back to callers.
//!
//! ## Switch lifecycle
//!
//! ```text
//! Idle ──► LockHeld ──► Validating ──► Applying ──► Committed ──► Idle
//!                            │
//!                            └──────► Rejected ──────────────────► Idle
//! ```
//!
//! A forced switch that could not take the lock skips `LockHeld` and enters
//! `Validating` directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use swarmgov_core::domain::audit::SwitchCounters;
use swarmgov_core::domain::coordinates::{ActiveCoordinates, AgentId, CoordinateValidation};
use swarmgov_core::domain::lock::LockRecord;
use swarmgov_core::domain::mode::ModeDiff;
use swarmgov_core::domain::validation::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPhase {
    Idle,
    LockHeld,
    Validating,
    Applying,
    Committed,
    Rejected,
}

impl SwitchPhase {
    pub fn can_transition_to(&self, next: SwitchPhase) -> bool {
        use SwitchPhase::*;
        matches!(
            (self, next),
            (Idle, LockHeld)
                | (Idle, Validating)
                | (Idle, Rejected)
                | (LockHeld, Validating)
                | (LockHeld, Rejected)
                | (Validating, Applying)
                | (Validating, Rejected)
                | (Applying, Committed)
                | (Applying, Rejected)
                | (Committed, Idle)
                | (Rejected, Idle)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected)
    }
}

impl fmt::Display for SwitchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LockHeld => "lock_held",
            Self::Validating => "validating",
            Self::Applying => "applying",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Which gates a forced switch may skip. Owner and target checks are never
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceScope {
    #[default]
    None,
    /// Proceed without the lock on timeout and ignore busy agents.
    Operational,
    /// `Operational`, plus apply even when validation fails.
    Full,
}

impl ForceScope {
    pub fn is_forced(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn bypasses_lock_timeout(&self) -> bool {
        self.is_forced()
    }

    pub fn bypasses_busy_check(&self) -> bool {
        self.is_forced()
    }

    pub fn bypasses_validators(&self) -> bool {
        matches!(self, Self::Full)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchOptions {
    pub owner: String,
    #[serde(default)]
    pub force: ForceScope,
    #[serde(default)]
    pub signature_path: Option<PathBuf>,
}

impl SwitchOptions {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            force: ForceScope::None,
            signature_path: None,
        }
    }

    pub fn with_force(mut self, force: ForceScope) -> Self {
        self.force = force;
        self
    }

    pub fn with_signature(mut self, path: impl Into<PathBuf>) -> Self {
        self.signature_path = Some(path.into());
        self
    }
}

/// Result of a committed switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchOutcome {
    pub success: bool,
    pub from: Option<u8>,
    pub to: u8,
    pub diff: ModeDiff,
    pub report: ValidationReport,
    pub snapshot: PathBuf,
    /// Newly included agents whose activation hook reported failure.
    #[serde(default)]
    pub activation_failures: Vec<AgentId>,
    pub forced: bool,
    pub lock_bypassed: bool,
    pub committed_at: DateTime<Utc>,
}

/// Read-only preview of a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePlan {
    pub target: u8,
    pub current: Option<u8>,
    pub diff: ModeDiff,
    pub coordinates: ActiveCoordinates,
    pub coordinate_check: CoordinateValidation,
    pub report: ValidationReport,
}

impl ModePlan {
    pub fn is_applicable(&self) -> bool {
        self.report.ok && self.coordinate_check.ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackOutcome {
    pub success: bool,
    pub from: Option<u8>,
    /// Mode restored; `None` when the snapshot predates the first switch.
    pub restored: Option<u8>,
    pub snapshot: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub mode: Option<u8>,
    pub include: Vec<AgentId>,
    pub lock_holder: Option<LockRecord>,
    pub lock_stale: bool,
    pub counters: SwitchCounters,
    pub snapshots: usize,
    pub last_change: Option<DateTime<Utc>>,
    pub last_report: Option<ValidationReport>,
}
