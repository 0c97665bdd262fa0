// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::mode::ActiveConfiguration;
use crate::domain::GovernanceError;
use crate::infrastructure::json_file::{read_json_opt, remove_if_exists, write_bytes_atomic, write_json_atomic};
use crate::infrastructure::layout::StateLayout;
use chrono::{DateTime, Utc};
use tracing::debug;

/// The applied configuration, persisted as two artifacts: the role record
/// (`active_config.json`) and the slot positions (`active_coordinates.json`).
#[derive(Debug, Clone)]
pub struct ActiveConfigStore {
    layout: StateLayout,
}

impl ActiveConfigStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    /// Current configuration with coordinates attached; `None` before the
    /// first successful switch.
    pub fn load(&self) -> Result<Option<ActiveConfiguration>, GovernanceError> {
        let Some(mut config) = read_json_opt::<ActiveConfiguration>(&self.layout.active_config())? else {
            return Ok(None);
        };
        config.coordinates = read_json_opt(&self.layout.active_coordinates())?.unwrap_or_default();
        Ok(Some(config))
    }

    /// Write both artifacts, record first. Each file is replaced atomically.
    pub fn save(&self, config: &ActiveConfiguration) -> Result<(), GovernanceError> {
        write_json_atomic(&self.layout.active_config(), config)?;
        write_json_atomic(&self.layout.active_coordinates(), &config.coordinates)?;
        debug!(mode = config.mode, "Active configuration written");
        Ok(())
    }

    /// Return to the unconfigured state.
    pub fn clear(&self) -> Result<(), GovernanceError> {
        remove_if_exists(&self.layout.active_config())?;
        remove_if_exists(&self.layout.active_coordinates())
    }

    pub fn current_mode(&self) -> Result<Option<u8>, GovernanceError> {
        Ok(self.load()?.map(|cfg| cfg.mode))
    }
}

/// Timestamp file external watchers poll to notice a reconfiguration.
#[derive(Debug, Clone)]
pub struct ChangeMarker {
    layout: StateLayout,
}

impl ChangeMarker {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn touch(&self) -> Result<DateTime<Utc>, GovernanceError> {
        let now = Utc::now();
        write_bytes_atomic(&self.layout.change_marker(), format!("{}\n", now.to_rfc3339()).as_bytes())?;
        Ok(now)
    }

    pub fn read(&self) -> Result<Option<DateTime<Utc>>, GovernanceError> {
        let path = self.layout.change_marker();
        match std::fs::read_to_string(&path) {
            Ok(body) => Ok(DateTime::parse_from_rfc3339(body.trim())
                .ok()
                .map(|ts| ts.with_timezone(&Utc))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GovernanceError::io(path, e)),
        }
    }
}
