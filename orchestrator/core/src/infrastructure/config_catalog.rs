// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::mode::{ModePreset, SUPPORTED_MODES};
use crate::domain::roles::RoleCatalog;
use crate::domain::GovernanceError;
use crate::infrastructure::json_file::{read_json, read_json_opt};
use crate::infrastructure::layout::StateLayout;
use tracing::warn;

/// Read-only access to mode presets and the role catalog.
#[derive(Debug, Clone)]
pub struct ConfigCatalog {
    layout: StateLayout,
}

impl ConfigCatalog {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    /// Preset for `mode`. A missing or unreadable preset is an apply error:
    /// the switch cannot proceed without it.
    pub fn load_preset(&self, mode: u8) -> Result<ModePreset, GovernanceError> {
        let path = self.layout.mode_preset(mode);
        if !path.exists() {
            return Err(GovernanceError::Apply(format!(
                "no preset for mode {} at {}",
                mode,
                path.display()
            )));
        }
        let mut preset: ModePreset = read_json(&path)
            .map_err(|e| GovernanceError::Apply(format!("invalid preset for mode {}: {}", mode, e)))?;
        preset.size = mode;
        Ok(preset)
    }

    /// Supported modes that have a preset file.
    pub fn available_modes(&self) -> Vec<u8> {
        SUPPORTED_MODES
            .iter()
            .copied()
            .filter(|mode| self.layout.mode_preset(*mode).exists())
            .collect()
    }

    /// Role catalog; empty when the file is absent.
    pub fn load_roles(&self) -> Result<RoleCatalog, GovernanceError> {
        let path = self.layout.role_catalog();
        match read_json_opt::<RoleCatalog>(&path)? {
            Some(catalog) => Ok(catalog.normalized()),
            None => {
                warn!("Role catalog not found at {}, no roles are assignable", path.display());
                Ok(RoleCatalog::default())
            }
        }
    }

    /// Role catalog as required by reconfiguration; absence is a config error.
    pub fn require_roles(&self) -> Result<RoleCatalog, GovernanceError> {
        let path = self.layout.role_catalog();
        match read_json_opt::<RoleCatalog>(&path)? {
            Some(catalog) => Ok(catalog.normalized()),
            None => Err(GovernanceError::Config(format!(
                "role catalog not found at {}",
                path.display()
            ))),
        }
    }
}
