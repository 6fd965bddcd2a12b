//! Home feeds: every kudo, or kudos from people the viewer follows.

use std::sync::Arc;

use pagination::{Page, PageRequest};

use super::ports::FeedQuery;
use super::service_support::persistence_failure;
use super::{Error, FeedEntry, RequestContext, Username};

/// Entries per feed page when no size is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Feed service implementing the home feed driving operations.
#[derive(Clone)]
pub struct FeedService<Q> {
    feeds: Arc<Q>,
    page_size: u32,
}

impl<Q> FeedService<Q> {
    /// Create a new service serving `page_size` entries per page.
    pub fn new(feeds: Arc<Q>, page_size: u32) -> Self {
        Self { feeds, page_size }
    }

    fn page_request(&self, raw_page: Option<&str>) -> Result<PageRequest, Error> {
        PageRequest::parse(raw_page, self.page_size)
            .map_err(|error| Error::internal(format!("page size misconfigured: {error}")))
    }
}

impl<Q> FeedService<Q>
where
    Q: FeedQuery,
{
    /// Global feed shown to anonymous visitors.
    ///
    /// `raw_page` is the untrusted page parameter; anything that is not a
    /// positive integer selects the first page.
    pub async fn feed_all(
        &self,
        ctx: &RequestContext,
        raw_page: Option<&str>,
    ) -> Result<Page<FeedEntry>, Error> {
        let request = self.page_request(raw_page)?;
        ctx.run(async {
            self.feeds
                .all(request)
                .await
                .map_err(|error| persistence_failure("feed_all", error))
        })
        .await
    }

    /// Feed of kudos written by users `viewer` follows.
    pub async fn feed_following(
        &self,
        ctx: &RequestContext,
        viewer: &Username,
        raw_page: Option<&str>,
    ) -> Result<Page<FeedEntry>, Error> {
        let request = self.page_request(raw_page)?;
        ctx.run(async {
            self.feeds
                .following(viewer, request)
                .await
                .map_err(|error| persistence_failure("feed_following", error))
        })
        .await
    }
}
