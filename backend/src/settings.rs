//! Store and service settings loaded via OrthoConfig.
//!
//! Every value can come from the command line, a configuration file, or a
//! `KUDOER_`-prefixed environment variable. Unset values fall back to the
//! defaults exposed by the accessors below.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_PAGE_SIZE, DEFAULT_RESET_TOKEN_TTL_MINUTES, DEFAULT_SEARCH_LIMIT};
use crate::outbound::persistence::{DEFAULT_INDEX_BATCH_SIZE, PoolConfig};

const DEFAULT_DATABASE_PATH: &str = "kudoer.db";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_REAP_INTERVAL_SECS: u64 = 600;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration for the store, the services, and the admin tooling.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "KUDOER")]
pub struct KudoerSettings {
    /// Path of the SQLite database file.
    pub database_path: Option<PathBuf>,
    /// Maximum number of pooled connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout_secs: Option<u64>,
    /// Entries per feed page.
    pub page_size: Option<u32>,
    /// Maximum number of search results.
    pub search_limit: Option<u32>,
    /// Rows indexed per transaction during a bulk search index build.
    pub index_batch_size: Option<u32>,
    /// Lifetime of a password reset token.
    pub reset_token_ttl_minutes: Option<i64>,
    /// Seconds between expired reset token sweeps.
    pub token_reap_interval_secs: Option<u64>,
    /// `pretty` or `json`.
    pub log_format: Option<String>,
}

impl Default for KudoerSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            connection_timeout_secs: None,
            page_size: None,
            search_limit: None,
            index_batch_size: None,
            reset_token_ttl_minutes: None,
            token_reap_interval_secs: None,
            log_format: None,
        }
    }
}

impl KudoerSettings {
    /// Database file, defaulting to `kudoer.db` in the working directory.
    pub fn database_path(&self) -> &Path {
        self.database_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_DATABASE_PATH))
    }

    /// Pool size, at least 1.
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.max(1)
    }

    /// Pool checkout timeout.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connection_timeout_secs
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
        )
    }

    /// Feed page size, at least 1.
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    /// Search result cap.
    pub fn search_limit(&self) -> u32 {
        self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }

    /// Bulk index batch size.
    pub fn index_batch_size(&self) -> u32 {
        self.index_batch_size.unwrap_or(DEFAULT_INDEX_BATCH_SIZE)
    }

    /// Reset token lifetime. Non-positive values fall back to the default.
    pub fn reset_token_ttl(&self) -> TimeDelta {
        let minutes = self
            .reset_token_ttl_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_RESET_TOKEN_TTL_MINUTES);
        TimeDelta::try_minutes(minutes)
            .unwrap_or_else(|| TimeDelta::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES))
    }

    /// Period of the expired token reaper. Zero falls back to the default.
    pub fn token_reap_interval(&self) -> Duration {
        let secs = self
            .token_reap_interval_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TOKEN_REAP_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Log output format. Unrecognised values fall back to pretty output.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// Pool configuration derived from these settings.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.database_path())
            .with_max_size(self.pool_max_size())
            .with_connection_timeout(self.connection_timeout())
    }
}
