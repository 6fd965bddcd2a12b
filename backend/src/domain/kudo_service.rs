//! Kudo upsert and per-item / per-user listings.

use std::sync::Arc;

use pagination::{Page, PageRequest};
use tracing::info;

use super::ports::{FeedQuery, KudoRepository, PersistenceError};
use super::service_support::persistence_failure;
use super::{
    Error, FeedEntry, ItemId, Kudo, KudoDraft, KudoId, RequestContext, UpsertOutcome, Username,
};

/// Kudo service implementing the reaction driving operations.
#[derive(Clone)]
pub struct KudoService<K, Q> {
    kudos: Arc<K>,
    feeds: Arc<Q>,
    page_size: u32,
}

impl<K, Q> KudoService<K, Q> {
    /// Create a new service listing `page_size` kudos per page.
    pub fn new(kudos: Arc<K>, feeds: Arc<Q>, page_size: u32) -> Self {
        Self {
            kudos,
            feeds,
            page_size,
        }
    }

    fn page_request(&self, raw_page: Option<&str>) -> Result<PageRequest, Error> {
        PageRequest::parse(raw_page, self.page_size)
            .map_err(|error| Error::internal(format!("page size misconfigured: {error}")))
    }
}

impl<K, Q> KudoService<K, Q>
where
    K: KudoRepository,
    Q: FeedQuery,
{
    /// Store the draft as the creator's only kudo for the item.
    ///
    /// Posting again for the same pair edits the existing kudo, which keeps
    /// its id and so its place in the feed.
    pub async fn upsert_kudo(
        &self,
        ctx: &RequestContext,
        draft: KudoDraft,
    ) -> Result<UpsertOutcome, Error> {
        ctx.ensure_active()?;
        let candidate = KudoId::generate();
        ctx.run(async {
            match self.kudos.upsert(&draft, candidate).await {
                Ok(outcome) => {
                    info!(
                        kudo_id = %outcome.id(),
                        item_id = %draft.item_id,
                        creator = %draft.creator_username,
                        created = outcome.is_created(),
                        "kudo stored"
                    );
                    Ok(outcome)
                }
                Err(PersistenceError::MissingReference { .. }) => {
                    Err(Error::not_found("item or user not found"))
                }
                Err(error) => Err(persistence_failure("upsert_kudo", error)),
            }
        })
        .await
    }

    /// The kudo `creator` gave `item_id`, for pre-filling the reaction form.
    pub async fn kudo_for(
        &self,
        ctx: &RequestContext,
        item_id: &ItemId,
        creator: &Username,
    ) -> Result<Option<Kudo>, Error> {
        ctx.run(async {
            self.kudos
                .find_for(item_id, creator)
                .await
                .map_err(|error| persistence_failure("kudo_for", error))
        })
        .await
    }

    /// Kudos given to one item, newest first.
    pub async fn kudos_for_item(
        &self,
        ctx: &RequestContext,
        item_id: &ItemId,
        raw_page: Option<&str>,
    ) -> Result<Page<FeedEntry>, Error> {
        let request = self.page_request(raw_page)?;
        ctx.run(async {
            self.feeds
                .for_item(item_id, request)
                .await
                .map_err(|error| persistence_failure("kudos_for_item", error))
        })
        .await
    }

    /// Kudos given by one user, newest first.
    pub async fn kudos_by_user(
        &self,
        ctx: &RequestContext,
        creator: &Username,
        raw_page: Option<&str>,
    ) -> Result<Page<FeedEntry>, Error> {
        let request = self.page_request(raw_page)?;
        ctx.run(async {
            self.feeds
                .by_user(creator, request)
                .await
                .map_err(|error| persistence_failure("kudos_by_user", error))
        })
        .await
    }
}
