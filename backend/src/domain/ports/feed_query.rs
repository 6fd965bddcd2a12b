//! Port abstraction for paginated kudo feeds.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{FeedEntry, ItemId, Username};

use super::PersistenceError;

/// Newest-first kudo listings joined with their display data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedQuery: Send + Sync {
    /// Every kudo.
    async fn all(&self, request: PageRequest) -> Result<Page<FeedEntry>, PersistenceError>;

    /// Kudos authored by users that `viewer` follows.
    async fn following(
        &self,
        viewer: &Username,
        request: PageRequest,
    ) -> Result<Page<FeedEntry>, PersistenceError>;

    /// Kudos given to one item.
    async fn for_item(
        &self,
        item_id: &ItemId,
        request: PageRequest,
    ) -> Result<Page<FeedEntry>, PersistenceError>;

    /// Kudos given by one user.
    async fn by_user(
        &self,
        creator: &Username,
        request: PageRequest,
    ) -> Result<Page<FeedEntry>, PersistenceError>;
}
