// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::governance_config::GovernanceConfig;
use std::path::{Path, PathBuf};

/// File locations of every artifact the engine reads or writes.
///
/// `config_dir` holds read-only inputs (canonical table, presets, catalog);
/// `state_dir` holds everything the engine mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    config_dir: PathBuf,
    state_dir: PathBuf,
}

impl StateLayout {
    pub fn new(config_dir: impl Into<PathBuf>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            state_dir: state_dir.into(),
        }
    }

    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self::new(&config.spec.paths.config_dir, &config.spec.paths.state_dir)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    // Inputs

    pub fn canonical_coordinates(&self) -> PathBuf {
        self.config_dir.join("canonical_coordinates.json")
    }

    pub fn legacy_coordinates(&self) -> PathBuf {
        self.config_dir.join("legacy_coordinates.json")
    }

    pub fn modes_dir(&self) -> PathBuf {
        self.config_dir.join("modes")
    }

    pub fn mode_preset(&self, mode: u8) -> PathBuf {
        self.modes_dir().join(format!("mode_{mode}.json"))
    }

    pub fn role_catalog(&self) -> PathBuf {
        self.config_dir.join("roles.json")
    }

    // State

    pub fn active_config(&self) -> PathBuf {
        self.state_dir.join("active_config.json")
    }

    pub fn active_coordinates(&self) -> PathBuf {
        self.state_dir.join("active_coordinates.json")
    }

    pub fn mode_history(&self) -> PathBuf {
        self.state_dir.join("mode_history.json")
    }

    pub fn role_history(&self) -> PathBuf {
        self.state_dir.join("role_history.json")
    }

    pub fn audit_ledger(&self) -> PathBuf {
        self.state_dir.join("audit").join("mode_switch.jsonl")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.state_dir.join("snapshots")
    }

    pub fn validation_report(&self) -> PathBuf {
        self.state_dir.join("reports").join("validation_report.json")
    }

    pub fn change_marker(&self) -> PathBuf {
        self.state_dir.join("config_changed.marker")
    }

    pub fn switch_counters(&self) -> PathBuf {
        self.state_dir.join("switch_counters.json")
    }

    pub fn switch_lock(&self) -> PathBuf {
        self.state_dir.join("locks").join("reconfigure.lock")
    }

    pub fn agent_status(&self) -> PathBuf {
        self.state_dir.join("agent_status.json")
    }
}
