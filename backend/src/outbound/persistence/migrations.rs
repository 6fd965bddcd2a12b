//! Embedded schema migrations.
//!
//! Migrations run on a dedicated synchronous connection inside
//! `spawn_blocking`, before the pool is handed out. Diesel records applied
//! versions in `__diesel_schema_migrations`, so re-running is a no-op and a
//! partially migrated store resumes at the first unapplied version.

use std::path::{Path, PathBuf};

use diesel::connection::SimpleConnection;
use diesel::{Connection, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::pool::CONNECTION_PRAGMAS;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while bringing the schema up to date.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The database file could not be opened.
    #[error("failed to open {path}: {message}")]
    Open { path: String, message: String },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
    /// The blocking task running the migrations panicked or was cancelled.
    #[error("migration task failed: {message}")]
    Task { message: String },
}

fn run_blocking(path: &Path) -> Result<Vec<String>, MigrationError> {
    let url = path.to_string_lossy().into_owned();
    let mut conn = SqliteConnection::establish(&url).map_err(|err| MigrationError::Open {
        path: url.clone(),
        message: err.to_string(),
    })?;
    conn.batch_execute(CONNECTION_PRAGMAS)
        .map_err(|err| MigrationError::Open {
            path: url.clone(),
            message: err.to_string(),
        })?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

/// Apply every pending migration to the SQLite file at `path`.
///
/// Returns the versions applied by this call; empty when the schema was
/// already current.
pub async fn run_migrations(path: impl Into<PathBuf>) -> Result<Vec<String>, MigrationError> {
    let path = path.into();
    let applied = tokio::task::spawn_blocking(move || run_blocking(&path))
        .await
        .map_err(|err| MigrationError::Task {
            message: err.to_string(),
        })??;
    if applied.is_empty() {
        info!("schema already current");
    } else {
        info!(count = applied.len(), versions = ?applied, "applied migrations");
    }
    Ok(applied)
}
