//! SQLite-backed `ItemRepository` implementation using Diesel ORM.
//!
//! The search index is maintained by triggers, so an inserted item is
//! searchable once the insert commits.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ItemRepository, PersistenceError};
use crate::domain::{Item, ItemId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::ItemRow;
use super::pool::DbPool;
use super::schema::items;

/// Diesel-backed implementation of the `ItemRepository` port.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn insert(&self, item: &Item) -> Result<(), PersistenceError> {
        let row = ItemRow::from(item);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(items::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find(&self, id: &ItemId) -> Result<Option<Item>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ItemRow> = items::table
            .find(id.to_string())
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Item::try_from).transpose()
    }
}
