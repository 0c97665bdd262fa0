// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::GovernanceError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex SHA-256 of a signed-intent file, recorded as `captain_sig` in the
/// audit ledger. `None` when the file does not exist.
pub fn digest_file(path: &Path) -> Result<Option<String>, GovernanceError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(hex::encode(Sha256::digest(&bytes)))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GovernanceError::io(path, e)),
    }
}
