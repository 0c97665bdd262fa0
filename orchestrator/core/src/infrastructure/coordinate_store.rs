// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Coordinate Store
//!
//! Reads the canonical (SSOT) position table and the active position table,
//! and bounds-checks either against the configured canvas.
//!
//! **Legacy migration:** older deployments kept a flat list
//! `[{"id": 1, "x": 100, "y": 200}, ...]` in `legacy_coordinates.json`.
//! [`CoordinateStore::migrate_legacy`] converts it once into the canonical
//! `{"1": [100, 200]}` table and never overwrites an existing canonical file.

use crate::domain::coordinates::{ActiveCoordinates, AgentId, CanonicalTable, Canvas, CoordinateValidation, Position};
use crate::domain::GovernanceError;
use crate::infrastructure::json_file::{read_json, read_json_opt, write_json_atomic};
use crate::infrastructure::layout::StateLayout;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    id: AgentId,
    x: i64,
    y: i64,
}

#[derive(Debug, Clone)]
pub struct CoordinateStore {
    layout: StateLayout,
    canvas: Canvas,
}

impl CoordinateStore {
    pub fn new(layout: StateLayout, canvas: Canvas) -> Self {
        Self { layout, canvas }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Canonical table. Missing or malformed files are configuration errors.
    pub fn load_canonical(&self) -> Result<CanonicalTable, GovernanceError> {
        let path = self.layout.canonical_coordinates();
        if !path.exists() {
            return Err(GovernanceError::Config(format!(
                "canonical coordinate table not found at {}",
                path.display()
            )));
        }
        read_json(&path)
    }

    /// Active slot positions; empty before the first switch.
    pub fn load_active(&self) -> Result<ActiveCoordinates, GovernanceError> {
        Ok(read_json_opt(&self.layout.active_coordinates())?.unwrap_or_default())
    }

    pub fn save_active(&self, coords: &ActiveCoordinates) -> Result<(), GovernanceError> {
        write_json_atomic(&self.layout.active_coordinates(), coords)
    }

    /// Bounds and shape check of an untyped table.
    pub fn validate(&self, table: &Value) -> CoordinateValidation {
        self.canvas.check_raw(table)
    }

    /// Canonical file as untyped JSON, so malformed entries can be reported
    /// instead of failing the whole load.
    pub fn load_canonical_raw(&self) -> Result<Value, GovernanceError> {
        read_json(&self.layout.canonical_coordinates())
    }

    pub fn validate_canonical(&self) -> Result<CoordinateValidation, GovernanceError> {
        Ok(self.validate(&self.load_canonical_raw()?))
    }

    /// Validation of the active table; `None` when nothing has been applied yet.
    pub fn validate_active(&self) -> Result<Option<CoordinateValidation>, GovernanceError> {
        let raw: Option<Value> = read_json_opt(&self.layout.active_coordinates())?;
        Ok(raw.map(|table| self.validate(&table)))
    }

    /// One-time conversion of the legacy flat list. Returns `false` when there
    /// is nothing to migrate.
    pub fn migrate_legacy(&self) -> Result<bool, GovernanceError> {
        let legacy_path = self.layout.legacy_coordinates();
        let canonical_path = self.layout.canonical_coordinates();

        if canonical_path.exists() {
            info!("Canonical coordinates already present, skipping legacy migration");
            return Ok(false);
        }
        let Some(raw) = read_json_opt::<Value>(&legacy_path)? else {
            return Ok(false);
        };
        let Some(items) = raw.as_array() else {
            warn!("Legacy coordinate file {} is not a list, ignoring", legacy_path.display());
            return Ok(false);
        };

        let mut table = CanonicalTable::new();
        for item in items {
            match serde_json::from_value::<LegacyEntry>(item.clone()) {
                Ok(entry) => {
                    table.insert(entry.id, Position::new(entry.x, entry.y));
                }
                Err(e) => warn!("Skipping malformed legacy coordinate entry {}: {}", item, e),
            }
        }
        if table.is_empty() {
            return Ok(false);
        }

        write_json_atomic(&canonical_path, &table)?;
        info!(
            "Migrated {} legacy coordinates into {}",
            table.len(),
            canonical_path.display()
        );
        Ok(true)
    }
}
