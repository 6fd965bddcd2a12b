//! Port abstraction for store-wide counters.

use async_trait::async_trait;

use crate::domain::StoreStats;

use super::PersistenceError;

/// Row counts shown on the admin dashboard.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsQuery: Send + Sync {
    /// Current counts of users, items, and kudos.
    async fn stats(&self) -> Result<StoreStats, PersistenceError>;
}
