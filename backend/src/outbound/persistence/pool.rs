//! Async-safe connection pool for Diesel SQLite connections.
//!
//! This module wraps `diesel-async` and `bb8` to provide an async connection
//! pool over a single SQLite file. SQLite itself is synchronous;
//! `SyncConnectionWrapper` runs each statement on tokio's blocking pool so
//! callers never block the runtime.
//!
//! # Design
//!
//! - Every new connection enables foreign keys, WAL journaling, and a busy
//!   timeout before it is handed out
//! - Pool checkout is non-blocking and respects timeout configuration
//! - Connections are validated before use to detect broken handles
//! - All errors are mapped to `PoolError` variants

use std::path::{Path, PathBuf};
use std::time::Duration;

use diesel::{ConnectionError, ConnectionResult, SqliteConnection};
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// Async SQLite connection handed out by the pool.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// Statements run on every new connection, pooled or not. Writers wait up
/// to five seconds on a locked database before failing.
pub(crate) const CONNECTION_PRAGMAS: &str = concat!(
    "PRAGMA foreign_keys = ON;",
    "PRAGMA busy_timeout = 5000;",
    "PRAGMA journal_mode = WAL;",
    "PRAGMA synchronous = NORMAL;",
);

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Failed to check out a connection from the pool.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },

    /// Failed to build the connection pool.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    /// Create a checkout error with the given message.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Create a build error with the given message.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Configuration for the database connection pool.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use kudoer::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("/var/lib/kudoer/kudoer.db")
///     .with_max_size(8)
///     .with_connection_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_size(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_path: PathBuf,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Create a new configuration for the SQLite file at `database_path`.
    ///
    /// Uses these defaults:
    /// - `max_size`: 10 connections
    /// - `connection_timeout`: 30 seconds
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            max_size: 10,
            connection_timeout: Duration::from_secs(30),
        }
    }

    /// Set the maximum number of connections in the pool.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// Set the connection checkout timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Path of the SQLite file.
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Maximum number of pooled connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Connection string understood by the SQLite driver.
    pub fn database_url(&self) -> String {
        self.database_path.to_string_lossy().into_owned()
    }
}

fn establish_sqlite(url: &str) -> BoxFuture<'_, ConnectionResult<SqliteConn>> {
    async move {
        let mut conn = SqliteConn::establish(url).await?;
        conn.batch_execute(CONNECTION_PRAGMAS)
            .await
            .map_err(ConnectionError::CouldntSetupConfiguration)?;
        Ok(conn)
    }
    .boxed()
}

/// Async connection pool for SQLite via Diesel.
///
/// # Example
///
/// ```ignore
/// let pool = DbPool::new(config).await?;
/// let mut conn = pool.get().await?;
/// // Use conn for Diesel operations...
/// ```
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<SqliteConn>,
}

impl DbPool {
    /// Create a new connection pool with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` if the pool cannot be constructed.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = Box::new(establish_sqlite);
        let manager = AsyncDieselConnectionManager::<SqliteConn>::new_with_config(
            config.database_url(),
            manager_config,
        );

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        Ok(Self { inner: pool })
    }

    /// Get a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Checkout` if a connection cannot be obtained within
    /// the configured timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, SqliteConn>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::sql_types::Integer;
    use diesel::{QueryableByName, sql_query};
    use diesel_async::RunQueryDsl;
    use rstest::rstest;

    #[derive(QueryableByName)]
    struct ForeignKeys {
        #[diesel(sql_type = Integer)]
        foreign_keys: i32,
    }

    #[rstest]
    fn pool_config_default_values() {
        let config = PoolConfig::new("/tmp/kudoer.db");

        assert_eq!(config.database_url(), "/tmp/kudoer.db");
        assert_eq!(config.max_size, 10);
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
    }

    #[rstest]
    fn pool_config_builder_pattern() {
        let config = PoolConfig::new("/tmp/kudoer.db")
            .with_max_size(0)
            .with_connection_timeout(Duration::from_secs(60));

        assert_eq!(config.max_size, 1);
        assert_eq!(config.connection_timeout, Duration::from_secs(60));
    }

    #[rstest]
    fn pool_error_display() {
        let checkout_err = PoolError::checkout("timed out");
        let build_err = PoolError::build("unable to open database file");

        assert!(checkout_err.to_string().contains("timed out"));
        assert!(build_err.to_string().contains("unable to open database file"));
    }

    #[tokio::test]
    async fn pooled_connections_enforce_foreign_keys() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pool = DbPool::new(PoolConfig::new(dir.path().join("pool.db")).with_max_size(2))
            .await
            .expect("pool builds");
        let mut conn = pool.get().await.expect("checkout");

        let row: ForeignKeys = sql_query("PRAGMA foreign_keys")
            .get_result(&mut conn)
            .await
            .expect("pragma readable");

        assert_eq!(row.foreign_keys, 1);
    }
}
