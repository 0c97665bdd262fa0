// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Engine-wide error type.
//!
//! Expected policy outcomes (a failed validation report, a demoted role) are
//! returned as data. Variants here abort the operation that raised them.

use crate::domain::coordinates::AgentId;
use crate::domain::lock::LockRecord;
use crate::domain::validation::ValidationReport;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("owner '{0}' is not authorized to reconfigure the swarm (expected captain or co_captain)")]
    Authority(String),

    #[error("mode {0} is not a supported swarm size (expected one of 2, 4, 5, 6, 8)")]
    InvalidMode(u8),

    #[error("switch lock not acquired within {waited_ms}ms{}", holder_suffix(.holder, .stale))]
    LockTimeout {
        waited_ms: u64,
        holder: Option<LockRecord>,
        stale: bool,
    },

    #[error("active operations detected on agents {0:?}")]
    ActiveOperations(Vec<AgentId>),

    #[error("validation failed: {}", .0.errors.join(", "))]
    Validation(ValidationReport),

    #[error("apply failed: {0}")]
    Apply(String),

    #[error("role policy violation: {0}")]
    RolePolicyViolation(String),

    #[error("no snapshot available for rollback")]
    NoSnapshot,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn holder_suffix(holder: &Option<LockRecord>, stale: &bool) -> String {
    match holder {
        Some(record) if *stale => format!(
            " (held by '{}' pid {}, lease expired at {})",
            record.owner, record.pid, record.lease_expires_at
        ),
        Some(record) => format!(" (held by '{}' pid {})", record.owner, record.pid),
        None => String::new(),
    }
}

impl GovernanceError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn serialization(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Stable machine-readable kind, used in audit records and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authority(_) => "authority_error",
            Self::InvalidMode(_) => "invalid_mode_error",
            Self::LockTimeout { .. } => "lock_timeout_error",
            Self::ActiveOperations(_) => "active_operations_error",
            Self::Validation(_) => "validation_error",
            Self::Apply(_) => "apply_error",
            Self::RolePolicyViolation(_) => "role_policy_violation",
            Self::NoSnapshot => "no_snapshot",
            Self::Config(_) => "config_error",
            Self::Io { .. } => "io_error",
            Self::Serialization { .. } => "serialization_error",
        }
    }
}
