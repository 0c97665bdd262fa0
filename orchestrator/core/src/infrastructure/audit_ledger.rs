// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Append-only JSON Lines ledger of reconfiguration attempts.
//!
//! Each append takes an exclusive advisory lock on the ledger file for the
//! duration of the write so lines from concurrent writers never interleave,
//! independently of the switch lock.

use crate::domain::audit::AuditRecord;
use crate::domain::GovernanceError;
use crate::infrastructure::layout::StateLayout;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AuditLedger {
    layout: StateLayout,
}

impl AuditLedger {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn append(&self, record: &AuditRecord) -> Result<(), GovernanceError> {
        let path = self.layout.audit_ledger();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GovernanceError::io(parent, e))?;
        }

        let mut line = serde_json::to_vec(record).map_err(|e| GovernanceError::serialization(&path, e))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| GovernanceError::io(&path, e))?;
        FileExt::lock_exclusive(&file).map_err(|e| GovernanceError::io(&path, e))?;
        let written = file.write_all(&line).and_then(|_| file.sync_data());
        let unlocked = FileExt::unlock(&file);
        written.map_err(|e| GovernanceError::io(&path, e))?;
        unlocked.map_err(|e| GovernanceError::io(&path, e))?;

        metrics::counter!("swarmgov_audit_records_total").increment(1);
        Ok(())
    }

    /// All parseable records in file order. Corrupt lines are skipped.
    pub fn records(&self) -> Result<Vec<AuditRecord>, GovernanceError> {
        let path = self.layout.audit_ledger();
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GovernanceError::io(&path, e)),
        };

        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| GovernanceError::io(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping corrupt audit line {} in {}: {}", number + 1, path.display(), e),
            }
        }
        Ok(records)
    }
}
