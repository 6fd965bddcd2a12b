//! Ranked search over items and users.

use std::sync::Arc;

use tracing::debug;

use super::ports::SearchRepository;
use super::service_support::persistence_failure;
use super::{Error, Item, RequestContext, SearchQuery, User};

/// Default cap on the number of search results.
pub const DEFAULT_SEARCH_LIMIT: u32 = 100;

/// Search service implementing the search driving operations.
#[derive(Clone)]
pub struct SearchService<S> {
    search: Arc<S>,
    limit: u32,
}

impl<S> SearchService<S> {
    /// Create a new service returning at most `limit` results per query.
    pub fn new(search: Arc<S>, limit: u32) -> Self {
        Self {
            search,
            limit: limit.max(1),
        }
    }
}

impl<S> SearchService<S>
where
    S: SearchRepository,
{
    /// Items matching `raw`, best match first.
    ///
    /// Input with no searchable token yields an empty list without touching
    /// the store.
    pub async fn search_items(&self, ctx: &RequestContext, raw: &str) -> Result<Vec<Item>, Error> {
        let Some(query) = SearchQuery::parse(raw) else {
            debug!("item search skipped: no tokens");
            return Ok(Vec::new());
        };
        ctx.run(async {
            self.search
                .search_items(&query, self.limit)
                .await
                .map_err(|error| persistence_failure("search_items", error))
        })
        .await
    }

    /// Users matching `raw`, best match first.
    pub async fn search_users(&self, ctx: &RequestContext, raw: &str) -> Result<Vec<User>, Error> {
        let Some(query) = SearchQuery::parse(raw) else {
            debug!("user search skipped: no tokens");
            return Ok(Vec::new());
        };
        ctx.run(async {
            self.search
                .search_users(&query, self.limit)
                .await
                .map_err(|error| persistence_failure("search_users", error))
        })
        .await
    }
}
