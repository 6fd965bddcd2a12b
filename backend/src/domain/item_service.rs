//! Item creation and lookup.

use std::sync::Arc;

use tracing::info;

use super::ports::{ItemRepository, PersistenceError};
use super::service_support::persistence_failure;
use super::{Error, Item, ItemId, NewItem, RequestContext};

/// Item service implementing the item driving operations.
#[derive(Clone)]
pub struct ItemService<I> {
    items: Arc<I>,
}

impl<I> ItemService<I> {
    /// Create a new service with the given repository.
    pub fn new(items: Arc<I>) -> Self {
        Self { items }
    }
}

impl<I> ItemService<I>
where
    I: ItemRepository,
{
    /// Mint an id for the item and store it. The item is searchable as soon
    /// as this returns.
    pub async fn create_item(&self, ctx: &RequestContext, new_item: NewItem) -> Result<Item, Error> {
        let item = Item {
            id: ItemId::generate(),
            creator_username: new_item.creator_username,
            name: new_item.name,
            description: new_item.description,
        };
        ctx.run(async {
            match self.items.insert(&item).await {
                Ok(()) => {
                    info!(item_id = %item.id, creator = %item.creator_username, "item created");
                    Ok(())
                }
                Err(PersistenceError::MissingReference { .. }) => Err(Error::not_found(format!(
                    "user {} not found",
                    item.creator_username
                ))),
                Err(error) => Err(persistence_failure("create_item", error)),
            }
        })
        .await?;
        Ok(item)
    }

    /// Fetch an item by id.
    pub async fn get_item(&self, ctx: &RequestContext, id: &ItemId) -> Result<Item, Error> {
        ctx.run(async {
            self.items
                .find(id)
                .await
                .map_err(|error| persistence_failure("get_item", error))?
                .ok_or_else(|| Error::not_found(format!("item {id} not found")))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockItemRepository;
    use crate::domain::{ErrorCode, ItemDescription, ItemName, Username};
    use rstest::rstest;

    fn new_item() -> NewItem {
        NewItem {
            creator_username: Username::new("alice").expect("valid"),
            name: ItemName::new("Nalgene bottle").expect("valid"),
            description: ItemDescription::new("A sturdy water bottle").expect("valid"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn create_item_mints_a_fresh_id() {
        let mut items = MockItemRepository::new();
        items.expect_insert().times(2).returning(|_| Ok(()));
        let service = ItemService::new(Arc::new(items));
        let ctx = RequestContext::new();

        let first = service.create_item(&ctx, new_item()).await.expect("created");
        let second = service.create_item(&ctx, new_item()).await.expect("created");

        assert!(first.id < second.id);
        assert_eq!(first.name.as_ref(), "Nalgene bottle");
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_creator_is_not_found() {
        let mut items = MockItemRepository::new();
        items
            .expect_insert()
            .times(1)
            .return_once(|_| Err(PersistenceError::missing_reference("users")));
        let service = ItemService::new(Arc::new(items));

        let err = service
            .create_item(&RequestContext::new(), new_item())
            .await
            .expect_err("missing creator");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn get_item_maps_missing_row_to_not_found() {
        let mut items = MockItemRepository::new();
        items.expect_find().times(1).return_once(|_| Ok(None));
        let service = ItemService::new(Arc::new(items));

        let err = service
            .get_item(&RequestContext::new(), &ItemId::generate())
            .await
            .expect_err("missing item");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
