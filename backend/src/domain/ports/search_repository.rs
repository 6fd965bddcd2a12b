//! Port abstraction for ranked full-text search.

use async_trait::async_trait;

use crate::domain::{Item, SearchQuery, User};

use super::PersistenceError;

/// Relevance-ranked lookups against the derived search index.
///
/// Results are full records in rank order, best match first, capped at
/// `limit`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Items whose name or description match.
    async fn search_items(
        &self,
        query: &SearchQuery,
        limit: u32,
    ) -> Result<Vec<Item>, PersistenceError>;

    /// Users whose username or display name match.
    async fn search_users(
        &self,
        query: &SearchQuery,
        limit: u32,
    ) -> Result<Vec<User>, PersistenceError>;
}
