//! Port abstraction for item persistence.

use async_trait::async_trait;

use crate::domain::{Item, ItemId};

use super::PersistenceError;

/// Stores items. Items are immutable once written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert a new item.
    ///
    /// Fails with [`PersistenceError::MissingReference`] when the creator
    /// does not exist.
    async fn insert(&self, item: &Item) -> Result<(), PersistenceError>;

    /// Fetch an item by id.
    async fn find(&self, id: &ItemId) -> Result<Option<Item>, PersistenceError>;
}
