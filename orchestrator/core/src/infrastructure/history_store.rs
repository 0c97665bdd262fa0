// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::audit::ModeHistoryEntry;
use crate::domain::roles::{RoleHistory, RoleHistoryEvent};
use crate::domain::GovernanceError;
use crate::infrastructure::json_file::{read_json_opt, write_json_atomic};
use crate::infrastructure::layout::StateLayout;

/// `mode_history.json`: JSON array, one entry per applied switch or rollback.
#[derive(Debug, Clone)]
pub struct ModeHistoryStore {
    layout: StateLayout,
}

impl ModeHistoryStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn entries(&self) -> Result<Vec<ModeHistoryEntry>, GovernanceError> {
        Ok(read_json_opt(&self.layout.mode_history())?.unwrap_or_default())
    }

    /// Read-modify-write. Callers hold the switch lock.
    pub fn append(&self, entry: ModeHistoryEntry) -> Result<(), GovernanceError> {
        let mut entries = self.entries()?;
        entries.push(entry);
        write_json_atomic(&self.layout.mode_history(), &entries)
    }
}

/// `role_history.json`: `{ "events": [...] }`.
#[derive(Debug, Clone)]
pub struct RoleHistoryStore {
    layout: StateLayout,
}

impl RoleHistoryStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn load(&self) -> Result<RoleHistory, GovernanceError> {
        Ok(read_json_opt(&self.layout.role_history())?.unwrap_or_default())
    }

    pub fn append(&self, event: RoleHistoryEvent) -> Result<(), GovernanceError> {
        let mut history = self.load()?;
        history.events.push(event);
        write_json_atomic(&self.layout.role_history(), &history)
    }
}
