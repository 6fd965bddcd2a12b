//! SQLite-backed `FollowRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{FollowRepository, PersistenceError};
use crate::domain::{UserSummary, Username};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::UserSummaryRow;
use super::pool::DbPool;
use super::schema::{users, users_following};

/// Diesel-backed implementation of the `FollowRepository` port.
#[derive(Clone)]
pub struct DieselFollowRepository {
    pool: DbPool,
}

impl DieselFollowRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_summaries(rows: Vec<UserSummaryRow>) -> Result<Vec<UserSummary>, PersistenceError> {
    rows.into_iter().map(UserSummary::try_from).collect()
}

#[async_trait]
impl FollowRepository for DieselFollowRepository {
    async fn follow(
        &self,
        follower: &Username,
        followee: &Username,
    ) -> Result<(), PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users_following::table)
            .values((
                users_following::username.eq(follower.as_ref()),
                users_following::following_username.eq(followee.as_ref()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn unfollow(
        &self,
        follower: &Username,
        followee: &Username,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            users_following::table
                .filter(users_following::username.eq(follower.as_ref()))
                .filter(users_following::following_username.eq(followee.as_ref())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn is_following(
        &self,
        follower: &Username,
        followee: &Username,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            users_following::table
                .filter(users_following::username.eq(follower.as_ref()))
                .filter(users_following::following_username.eq(followee.as_ref())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn followers(&self, username: &Username) -> Result<Vec<UserSummary>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserSummaryRow> = users_following::table
            .inner_join(users::table.on(users::username.eq(users_following::username)))
            .filter(users_following::following_username.eq(username.as_ref()))
            .order_by(users::username)
            .select((users::username, users::displayname))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_summaries(rows)
    }

    async fn following(&self, username: &Username) -> Result<Vec<UserSummary>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserSummaryRow> = users_following::table
            .inner_join(users::table.on(users::username.eq(users_following::following_username)))
            .filter(users_following::username.eq(username.as_ref()))
            .order_by(users::username)
            .select((users::username, users::displayname))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_summaries(rows)
    }
}
