//! SQLite-backed `StatsQuery` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::StoreStats;
use crate::domain::ports::{PersistenceError, StatsQuery};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::{items, kudos, users};

/// Diesel-backed implementation of the `StatsQuery` port.
#[derive(Clone)]
pub struct DieselStatsQuery {
    pool: DbPool,
}

impl DieselStatsQuery {
    /// Create a new query adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn as_count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or_default()
}

#[async_trait]
impl StatsQuery for DieselStatsQuery {
    async fn stats(&self) -> Result<StoreStats, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_count: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let item_count: i64 = items::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let kudo_count: i64 = kudos::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(StoreStats {
            users: as_count(user_count),
            items: as_count(item_count),
            kudos: as_count(kudo_count),
        })
    }
}
