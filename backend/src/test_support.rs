//! Test utilities for the kudoer crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is compiled for tests and when the
//! `test-support` feature is enabled.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::domain::Username;
use crate::domain::ports::{SessionInvalidationError, SessionInvalidator};
use crate::outbound::persistence::{DbPool, PoolConfig, run_migrations};

/// Clock frozen at a chosen instant and moved only by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Migrated SQLite file in a temporary directory, removed on drop.
pub struct TempStore {
    _dir: TempDir,
    path: PathBuf,
}

impl TempStore {
    /// Create and migrate a fresh database.
    pub async fn migrated() -> Self {
        let dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("create temp dir: {error}"),
        };
        let path = dir.path().join("kudoer.db");
        if let Err(error) = run_migrations(path.clone()).await {
            panic!("migrate temp store: {error}");
        }
        Self { _dir: dir, path }
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pool over the database with `max_size` connections.
    pub async fn pool(&self, max_size: u32) -> DbPool {
        let config = PoolConfig::new(self.path.clone())
            .with_max_size(max_size)
            .with_connection_timeout(Duration::from_secs(10));
        match DbPool::new(config).await {
            Ok(pool) => pool,
            Err(error) => panic!("build pool: {error}"),
        }
    }
}

/// In-memory invalidator that records each call, so tests can assert which
/// users were signed out.
#[derive(Debug, Default)]
pub struct FixtureSessionInvalidator {
    calls: Mutex<Vec<(Username, Option<String>)>>,
}

impl FixtureSessionInvalidator {
    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<(Username, Option<String>)> {
        match self.calls.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl SessionInvalidator for FixtureSessionInvalidator {
    async fn invalidate_all(
        &self,
        username: &Username,
        keep: Option<String>,
    ) -> Result<(), SessionInvalidationError> {
        let mut guard = match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((username.clone(), keep));
        Ok(())
    }
}
