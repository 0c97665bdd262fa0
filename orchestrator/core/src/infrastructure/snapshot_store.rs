// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pre-change snapshots, one file per switch:
//! `snapshots/snapshot_<UTC %Y%m%dT%H%M%S.ffffffZ>.json`.
//!
//! File names sort chronologically, so the latest snapshot is the
//! lexicographically greatest name. Two snapshots in the same microsecond get
//! a `_<n>` suffix.

use crate::domain::audit::Snapshot;
use crate::domain::mode::ActiveConfiguration;
use crate::domain::GovernanceError;
use crate::infrastructure::json_file::{read_json, write_json_atomic};
use crate::infrastructure::layout::StateLayout;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

const PREFIX: &str = "snapshot_";
const SUFFIX: &str = ".json";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    layout: StateLayout,
}

impl SnapshotStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    /// Capture `config` (or the unconfigured state) and return the file written.
    pub fn save(&self, config: Option<&ActiveConfiguration>) -> Result<PathBuf, GovernanceError> {
        let snapshot = Snapshot::capture(config);
        let dir = self.layout.snapshots_dir();
        let stamp = snapshot.ts.format("%Y%m%dT%H%M%S%.6fZ").to_string();

        let mut path = dir.join(format!("{PREFIX}{stamp}{SUFFIX}"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{PREFIX}{stamp}_{n}{SUFFIX}"));
            n += 1;
        }

        write_json_atomic(&path, &snapshot)?;
        debug!("Snapshot written to {}", path.display());
        Ok(path)
    }

    /// Snapshot files, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>, GovernanceError> {
        let dir = self.layout.snapshots_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GovernanceError::io(&dir, e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GovernanceError::io(&dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(PREFIX) && name.ends_with(SUFFIX) {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    pub fn latest(&self) -> Result<Option<(PathBuf, Snapshot)>, GovernanceError> {
        match self.list()?.pop() {
            Some(path) => {
                let snapshot = read_json(&path)?;
                Ok(Some((path, snapshot)))
            }
            None => Ok(None),
        }
    }

    /// Keep the newest `retention` snapshots and delete the rest.
    pub fn prune(&self, retention: usize) -> Result<usize, GovernanceError> {
        let paths = self.list()?;
        if paths.len() <= retention {
            return Ok(0);
        }
        let excess = paths.len() - retention;
        for path in &paths[..excess] {
            std::fs::remove_file(path).map_err(|e| GovernanceError::io(path, e))?;
        }
        info!("Pruned {} snapshots, {} retained", excess, retention);
        Ok(excess)
    }
}
