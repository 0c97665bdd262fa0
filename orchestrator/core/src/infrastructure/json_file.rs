// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON artifact persistence.
//!
//! Every write goes to a temporary file in the destination directory and is
//! then renamed over the target, so concurrent readers see either the old or
//! the new document, never a torn one.

use crate::domain::GovernanceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, GovernanceError> {
    let bytes = std::fs::read(path).map_err(|e| GovernanceError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| GovernanceError::serialization(path, e))
}

/// Like [`read_json`] but a missing file yields `None`.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, GovernanceError> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| GovernanceError::serialization(path, e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GovernanceError::io(path, e)),
    }
}

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), GovernanceError> {
    let mut body = serde_json::to_vec_pretty(value).map_err(|e| GovernanceError::serialization(path, e))?;
    body.push(b'\n');
    write_bytes_atomic(path, &body)
}

pub fn write_bytes_atomic(path: &Path, body: &[u8]) -> Result<(), GovernanceError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| GovernanceError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| GovernanceError::io(parent, e))?;
    tmp.write_all(body).map_err(|e| GovernanceError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| GovernanceError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| GovernanceError::io(path, e.error))?;
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<(), GovernanceError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GovernanceError::io(path, e)),
    }
}
