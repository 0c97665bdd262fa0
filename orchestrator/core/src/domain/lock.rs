// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lease written into the switch lock file by its current holder.
///
/// The lock itself is the OS advisory lock on the file; this record only says
/// who holds it and until when the holder promised to renew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub owner: String,
    pub token: Uuid,
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub lease_expires_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn new(owner: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            owner: owner.to_string(),
            token: Uuid::new_v4(),
            pid: std::process::id(),
            acquired_at: now,
            lease_expires_at: now + ttl,
        }
    }

    pub fn renew(&mut self, ttl: Duration) {
        self.lease_expires_at = Utc::now() + ttl;
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.lease_expires_at
    }
}
