// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Switch Lock
//!
//! Cross-process mutual exclusion for every mutating governance operation
//! (switch, rollback, role assignment).
//!
//! The lock is an exclusive OS advisory lock on `locks/reconfigure.lock`. The
//! holder also writes a [`LockRecord`] lease into the file so waiters can
//! report who is holding the lock and whether that holder stopped renewing.
//! The OS releases the advisory lock when the holding process exits, so a
//! crashed holder never blocks the next acquirer; its leftover lease is logged
//! and overwritten.
//!
//! ```text
//! acquire ──► try_lock_exclusive ──ok──► write lease ──► LockGuard
//!                 │ contended
//!                 └──► sleep(poll_interval) ──► retry until timeout ──► LockTimeout
//! ```

use crate::domain::governance_config::LockConfig;
use crate::domain::lock::LockRecord;
use crate::domain::GovernanceError;
use crate::infrastructure::layout::StateLayout;
use chrono::Utc;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SwitchLock {
    path: PathBuf,
    poll_interval: Duration,
    timeout: Duration,
    lease_ttl: chrono::Duration,
}

impl SwitchLock {
    pub fn new(layout: &StateLayout, settings: &LockConfig) -> Self {
        Self::with_timing(
            layout.switch_lock(),
            settings.poll_interval(),
            settings.timeout(),
            settings.lease_ttl(),
        )
    }

    pub fn with_timing(path: impl Into<PathBuf>, poll_interval: Duration, timeout: Duration, lease_ttl: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            timeout,
            lease_ttl: chrono::Duration::from_std(lease_ttl).unwrap_or_else(|_| chrono::Duration::seconds(120)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Single non-blocking attempt. `Ok(None)` when another holder has it.
    pub fn try_acquire(&self, owner: &str) -> Result<Option<LockGuard>, GovernanceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GovernanceError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| GovernanceError::io(&self.path, e))?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if is_contended(&e) {
                return Ok(None);
            }
            return Err(GovernanceError::io(&self.path, e));
        }

        if let Some(previous) = read_record(&file) {
            warn!(
                "Recovered switch lock left by '{}' (pid {}, lease expired at {})",
                previous.owner, previous.pid, previous.lease_expires_at
            );
        }

        let mut guard = LockGuard {
            file,
            path: self.path.clone(),
            record: LockRecord::new(owner, self.lease_ttl),
            lease_ttl: self.lease_ttl,
            released: false,
        };
        guard.write_record()?;
        debug!(owner, token = %guard.record.token, "Switch lock acquired");
        Ok(Some(guard))
    }

    /// Poll until the lock is free or the timeout elapses.
    pub async fn acquire(&self, owner: &str) -> Result<LockGuard, GovernanceError> {
        let started = Instant::now();
        loop {
            if let Some(guard) = self.try_acquire(owner)? {
                return Ok(guard);
            }
            let waited = started.elapsed();
            if waited >= self.timeout {
                let holder = self.holder().ok().flatten();
                let stale = holder
                    .as_ref()
                    .map(|record| record.is_expired_at(Utc::now()))
                    .unwrap_or(false);
                metrics::counter!("swarmgov_lock_timeouts_total").increment(1);
                return Err(GovernanceError::LockTimeout {
                    waited_ms: waited.as_millis() as u64,
                    holder,
                    stale,
                });
            }
            tokio::time::sleep(self.poll_interval.min(self.timeout - waited)).await;
        }
    }

    /// Lease of the current (or last crashed) holder, if any.
    pub fn holder(&self) -> Result<Option<LockRecord>, GovernanceError> {
        match File::open(&self.path) {
            Ok(file) => Ok(read_record(&file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GovernanceError::io(&self.path, e)),
        }
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn read_record(mut file: &File) -> Option<LockRecord> {
    let mut body = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut body).ok()?;
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(body.trim()).ok()
}

/// Held switch lock. Released on [`LockGuard::release`] or drop.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
    record: LockRecord,
    lease_ttl: chrono::Duration,
    released: bool,
}

impl LockGuard {
    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    /// Extend the lease. Called between apply steps of a long switch.
    pub fn renew(&mut self) -> Result<(), GovernanceError> {
        self.record.renew(self.lease_ttl);
        self.write_record()
    }

    pub fn release(mut self) -> Result<(), GovernanceError> {
        self.unlock()
    }

    fn write_record(&mut self) -> Result<(), GovernanceError> {
        let body = serde_json::to_vec(&self.record).map_err(|e| GovernanceError::serialization(&self.path, e))?;
        self.file
            .set_len(0)
            .and_then(|_| self.file.seek(SeekFrom::Start(0)))
            .and_then(|_| self.file.write_all(&body))
            .and_then(|_| self.file.sync_data())
            .map_err(|e| GovernanceError::io(&self.path, e))
    }

    fn unlock(&mut self) -> Result<(), GovernanceError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let cleared = self.file.set_len(0);
        FileExt::unlock(&self.file).map_err(|e| GovernanceError::io(&self.path, e))?;
        cleared.map_err(|e| GovernanceError::io(&self.path, e))?;
        info!(owner = %self.record.owner, "Switch lock released");
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.unlock() {
            warn!("Failed to release switch lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(dir: &tempfile::TempDir, timeout_ms: u64) -> SwitchLock {
        SwitchLock::with_timing(
            dir.path().join("locks").join("reconfigure.lock"),
            Duration::from_millis(20),
            Duration::from_millis(timeout_ms),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_second_attempt_is_refused_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock = lock(&dir, 100);

        let guard = lock.try_acquire("captain").unwrap().expect("first acquire");
        assert!(lock.try_acquire("co_captain").unwrap().is_none());
        assert_eq!(lock.holder().unwrap().unwrap().owner, "captain");

        guard.release().unwrap();
        assert!(lock.holder().unwrap().is_none());
        assert!(lock.try_acquire("co_captain").unwrap().is_some());
    }

    #[test]
    fn test_drop_releases() {
        let dir = tempfile::tempdir().unwrap();
        let lock = lock(&dir, 100);
        {
            let _guard = lock.try_acquire("captain").unwrap().unwrap();
        }
        assert!(lock.try_acquire("captain").unwrap().is_some());
    }

    #[test]
    fn test_renew_extends_lease() {
        let dir = tempfile::tempdir().unwrap();
        let lock = lock(&dir, 100);
        let mut guard = lock.try_acquire("captain").unwrap().unwrap();
        let before = guard.record().lease_expires_at;
        std::thread::sleep(Duration::from_millis(5));
        guard.renew().unwrap();
        let on_disk = lock.holder().unwrap().unwrap();
        assert!(on_disk.lease_expires_at > before);
        assert_eq!(on_disk.token, guard.record().token);
    }

    #[tokio::test]
    async fn test_acquire_times_out_with_holder() {
        let dir = tempfile::tempdir().unwrap();
        let lock = lock(&dir, 100);
        let _held = lock.try_acquire("co_captain").unwrap().unwrap();

        let started = Instant::now();
        let err = lock.acquire("captain").await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_millis(100));
        match err {
            GovernanceError::LockTimeout { holder, stale, .. } => {
                assert_eq!(holder.unwrap().owner, "co_captain");
                assert!(!stale);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock = lock(&dir, 2_000);
        let held = lock.try_acquire("co_captain").unwrap().unwrap();

        let releaser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            held.release().unwrap();
        });
        let guard = lock.acquire("captain").await.unwrap();
        assert_eq!(guard.record().owner, "captain");
        releaser.await.unwrap();
    }

    #[test]
    fn test_leftover_record_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let lock = lock(&dir, 100);
        std::fs::create_dir_all(lock.path().parent().unwrap()).unwrap();
        let stale = LockRecord::new("crashed", chrono::Duration::seconds(-30));
        std::fs::write(lock.path(), serde_json::to_vec(&stale).unwrap()).unwrap();

        let guard = lock.try_acquire("captain").unwrap().unwrap();
        assert_eq!(lock.holder().unwrap().unwrap().token, guard.record().token);
    }
}
