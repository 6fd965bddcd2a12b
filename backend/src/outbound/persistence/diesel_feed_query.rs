//! SQLite-backed `FeedQuery` implementation using Diesel ORM.
//!
//! Every feed is `kudos ⋈ users ⋈ items ⟕ profile_pictures(kind = small)`
//! ordered by kudo id, newest first. ULIDs sort by creation time, so the id
//! doubles as a stable, unique sort key and pages never overlap. Each query
//! fetches one row beyond the page to learn whether a next page exists.
//!
//! The "following" feed adds `users_following` and is assembled on read.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{FeedQuery, PersistenceError};
use crate::domain::{FeedEntry, ItemId, ProfilePictureKind, Username};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::FeedRow;
use super::pool::DbPool;
use super::schema::{items, kudos, profile_pictures, users, users_following};

/// Join the display tables onto a query rooted at `kudos`.
macro_rules! with_display_joins {
    ($source:expr) => {
        $source
            .inner_join(users::table.on(users::username.eq(kudos::creator_username)))
            .inner_join(items::table.on(items::id.eq(kudos::item_id)))
            .left_join(
                profile_pictures::table.on(profile_pictures::username
                    .eq(kudos::creator_username)
                    .and(profile_pictures::kind.eq(ProfilePictureKind::Small.as_i32()))),
            )
    };
}

/// Order, window, and project a filtered feed query, then load it.
macro_rules! load_feed_page {
    ($query:expr, $request:expr, $conn:expr) => {
        $query
            .order_by(kudos::id.desc())
            .limit($request.fetch_limit())
            .offset($request.offset())
            .select((
                kudos::id,
                kudos::item_id,
                items::name,
                kudos::creator_username,
                users::displayname,
                profile_pictures::filename.nullable(),
                kudos::frame,
                kudos::emoji,
                kudos::body,
            ))
            .load::<FeedRow>($conn)
            .await
            .map_err(map_diesel_error)
    };
}

/// Diesel-backed implementation of the `FeedQuery` port.
#[derive(Clone)]
pub struct DieselFeedQuery {
    pool: DbPool,
}

impl DieselFeedQuery {
    /// Create a new query adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_page(
    request: PageRequest,
    rows: Vec<FeedRow>,
) -> Result<Page<FeedEntry>, PersistenceError> {
    let entries = rows
        .into_iter()
        .map(FeedEntry::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::from_overfetch(request, entries))
}

#[async_trait]
impl FeedQuery for DieselFeedQuery {
    async fn all(&self, request: PageRequest) -> Result<Page<FeedEntry>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = load_feed_page!(with_display_joins!(kudos::table), request, &mut conn)?;
        into_page(request, rows)
    }

    async fn following(
        &self,
        viewer: &Username,
        request: PageRequest,
    ) -> Result<Page<FeedEntry>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let source = kudos::table.inner_join(
            users_following::table
                .on(users_following::following_username.eq(kudos::creator_username)),
        );
        let rows = load_feed_page!(
            with_display_joins!(source).filter(users_following::username.eq(viewer.as_ref())),
            request,
            &mut conn
        )?;
        into_page(request, rows)
    }

    async fn for_item(
        &self,
        item_id: &ItemId,
        request: PageRequest,
    ) -> Result<Page<FeedEntry>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = load_feed_page!(
            with_display_joins!(kudos::table).filter(kudos::item_id.eq(item_id.to_string())),
            request,
            &mut conn
        )?;
        into_page(request, rows)
    }

    async fn by_user(
        &self,
        creator: &Username,
        request: PageRequest,
    ) -> Result<Page<FeedEntry>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = load_feed_page!(
            with_display_joins!(kudos::table).filter(kudos::creator_username.eq(creator.as_ref())),
            request,
            &mut conn
        )?;
        into_page(request, rows)
    }
}
