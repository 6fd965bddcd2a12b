//! SQLite-backed `SearchRepository` implementation over the FTS5 indexes.

use async_trait::async_trait;

use crate::domain::ports::{PersistenceError, SearchRepository};
use crate::domain::{Item, SearchQuery, User};

use super::pool::DbPool;
use super::ranked_correlation::{ItemSearch, UserSearch, ranked_search};

/// Diesel-backed implementation of the `SearchRepository` port.
#[derive(Clone)]
pub struct DieselSearchRepository {
    pool: DbPool,
}

impl DieselSearchRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchRepository for DieselSearchRepository {
    async fn search_items(
        &self,
        query: &SearchQuery,
        limit: u32,
    ) -> Result<Vec<Item>, PersistenceError> {
        ranked_search::<ItemSearch>(&self.pool, query, limit).await
    }

    async fn search_users(
        &self,
        query: &SearchQuery,
        limit: u32,
    ) -> Result<Vec<User>, PersistenceError> {
        ranked_search::<UserSearch>(&self.pool, query, limit).await
    }
}
