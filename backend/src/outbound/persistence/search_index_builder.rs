//! Bulk population of the FTS5 search indexes.
//!
//! Triggers keep each index in step with its base table once it exists, but
//! rows written before the index was introduced are only picked up by a bulk
//! build. A row in `search_index_builds` marks an index as complete; while
//! that row is absent the index is treated as not built, and the next
//! [`SearchIndexMaintenance::ensure_built`] call rebuilds it from scratch.
//!
//! The build pages through the base table by key. Each page commits in its
//! own transaction, deleting any copies a trigger already wrote before
//! inserting the page, so concurrent writes never leave duplicates behind.

use std::fmt;

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::{info, warn};

use crate::domain::ports::PersistenceError;

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::ItemRow;
use super::pool::{DbPool, SqliteConn};
use super::schema::{items, items_search, search_index_builds, users, users_search};

/// Default number of base rows indexed per transaction.
pub const DEFAULT_INDEX_BATCH_SIZE: u32 = 500;

/// One of the derived full-text indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchIndexKind {
    /// `items_search`, over item names and descriptions.
    Items,
    /// `users_search`, over usernames and display names.
    Users,
}

impl SearchIndexKind {
    /// Every index, in build order.
    pub const ALL: [Self; 2] = [Self::Items, Self::Users];

    /// Name recorded in `search_index_builds`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Items => "items_search",
            Self::Users => "users_search",
        }
    }
}

impl fmt::Display for SearchIndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator view of one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStatus {
    pub kind: SearchIndexKind,
    /// Documents currently in the index.
    pub documents: u64,
    /// Whether a bulk build has completed.
    pub built: bool,
}

/// Builds and inspects the search indexes.
#[derive(Clone)]
pub struct SearchIndexMaintenance {
    pool: DbPool,
    batch_size: i64,
}

impl SearchIndexMaintenance {
    /// Create a builder that indexes `batch_size` rows per transaction.
    /// A zero batch size is raised to 1.
    pub fn new(pool: DbPool, batch_size: u32) -> Self {
        Self {
            pool,
            batch_size: i64::from(batch_size.max(1)),
        }
    }

    /// Build the index unless a completed build is recorded. Returns `true`
    /// when a build ran.
    pub async fn ensure_built(&self, kind: SearchIndexKind) -> Result<bool, PersistenceError> {
        if self.is_built(kind).await? {
            return Ok(false);
        }
        self.build(kind).await?;
        Ok(true)
    }

    /// Discard the completion record and build the index again.
    pub async fn rebuild(&self, kind: SearchIndexKind) -> Result<(), PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(search_index_builds::table.find(kind.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        drop(conn);
        self.build(kind).await
    }

    /// Document count and completion flag for `kind`.
    pub async fn status(&self, kind: SearchIndexKind) -> Result<IndexStatus, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let documents: i64 = match kind {
            SearchIndexKind::Items => items_search::table.count().get_result(&mut conn).await,
            SearchIndexKind::Users => users_search::table.count().get_result(&mut conn).await,
        }
        .map_err(map_diesel_error)?;
        let built = marker_exists(&mut conn, kind).await?;
        Ok(IndexStatus {
            kind,
            documents: u64::try_from(documents).unwrap_or_default(),
            built,
        })
    }

    async fn is_built(&self, kind: SearchIndexKind) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        marker_exists(&mut conn, kind).await
    }

    async fn build(&self, kind: SearchIndexKind) -> Result<(), PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        info!(index = %kind, batch_size = self.batch_size, "building search index");
        match self.populate(&mut conn, kind).await {
            Ok(documents) => {
                info!(index = %kind, documents, "search index built");
                Ok(())
            }
            Err(error) => {
                if let Err(cleanup) = clear_index(&mut conn, kind).await {
                    warn!(index = %kind, error = %cleanup, "failed to clear partial search index");
                }
                Err(error)
            }
        }
    }

    async fn populate(
        &self,
        conn: &mut SqliteConn,
        kind: SearchIndexKind,
    ) -> Result<u64, PersistenceError> {
        clear_index(conn, kind).await?;

        let mut last = String::new();
        let mut documents = 0_u64;
        loop {
            let indexed = match kind {
                SearchIndexKind::Items => index_item_page(conn, &last, self.batch_size).await?,
                SearchIndexKind::Users => index_user_page(conn, &last, self.batch_size).await?,
            };
            let Some(page_last) = indexed.last_key else {
                break;
            };
            documents += indexed.count;
            last = page_last;
            tokio::task::yield_now().await;
        }

        diesel::replace_into(search_index_builds::table)
            .values((
                search_index_builds::name.eq(kind.as_str()),
                search_index_builds::built_at.eq(Utc::now().timestamp()),
            ))
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(documents)
    }
}

struct IndexedPage {
    count: u64,
    last_key: Option<String>,
}

impl IndexedPage {
    fn from_keys(keys: &[String]) -> Self {
        Self {
            count: keys.len() as u64,
            last_key: keys.last().cloned(),
        }
    }
}

async fn marker_exists(
    conn: &mut SqliteConn,
    kind: SearchIndexKind,
) -> Result<bool, PersistenceError> {
    diesel::select(diesel::dsl::exists(
        search_index_builds::table.find(kind.as_str()),
    ))
    .get_result(conn)
    .await
    .map_err(map_diesel_error)
}

async fn clear_index(conn: &mut SqliteConn, kind: SearchIndexKind) -> Result<(), PersistenceError> {
    match kind {
        SearchIndexKind::Items => diesel::delete(items_search::table).execute(conn).await,
        SearchIndexKind::Users => diesel::delete(users_search::table).execute(conn).await,
    }
    .map(|_| ())
    .map_err(map_diesel_error)
}

async fn index_item_page(
    conn: &mut SqliteConn,
    after: &str,
    batch_size: i64,
) -> Result<IndexedPage, PersistenceError> {
    let after = after.to_owned();
    conn.transaction(|conn| {
        async move {
            let rows: Vec<ItemRow> = items::table
                .filter(items::id.gt(&after))
                .order_by(items::id)
                .limit(batch_size)
                .select(ItemRow::as_select())
                .load(conn)
                .await?;
            let keys: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
            if keys.is_empty() {
                return Ok(IndexedPage::from_keys(&keys));
            }
            diesel::delete(items_search::table.filter(items_search::id.eq_any(&keys)))
                .execute(conn)
                .await?;
            for row in &rows {
                diesel::insert_into(items_search::table)
                    .values((
                        items_search::id.eq(row.id.as_str()),
                        items_search::name.eq(row.name.as_str()),
                        items_search::description.eq(row.description.as_str()),
                    ))
                    .execute(conn)
                    .await?;
            }
            Ok(IndexedPage::from_keys(&keys))
        }
        .scope_boxed()
    })
    .await
    .map_err(map_diesel_error)
}

async fn index_user_page(
    conn: &mut SqliteConn,
    after: &str,
    batch_size: i64,
) -> Result<IndexedPage, PersistenceError> {
    let after = after.to_owned();
    conn.transaction(|conn| {
        async move {
            let rows: Vec<(String, String)> = users::table
                .filter(users::username.gt(&after))
                .order_by(users::username)
                .limit(batch_size)
                .select((users::username, users::displayname))
                .load(conn)
                .await?;
            let keys: Vec<String> = rows.iter().map(|(username, _)| username.clone()).collect();
            if keys.is_empty() {
                return Ok(IndexedPage::from_keys(&keys));
            }
            diesel::delete(users_search::table.filter(users_search::id.eq_any(&keys)))
                .execute(conn)
                .await?;
            for (username, displayname) in &rows {
                diesel::insert_into(users_search::table)
                    .values((
                        users_search::id.eq(username.as_str()),
                        users_search::username.eq(username.as_str()),
                        users_search::displayname.eq(displayname.as_str()),
                    ))
                    .execute(conn)
                    .await?;
            }
            Ok(IndexedPage::from_keys(&keys))
        }
        .scope_boxed()
    })
    .await
    .map_err(map_diesel_error)
}
