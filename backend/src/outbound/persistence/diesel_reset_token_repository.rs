//! SQLite-backed `ResetTokenRepository` implementation using Diesel ORM.
//!
//! Expiry is stored as Unix seconds. A token is live while `expiry > now`,
//! so a token expiring exactly at `now` is already dead and is also the
//! first to be reaped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{PersistenceError, ResetTokenRepository};
use crate::domain::{PasswordHash, ResetTokenHash, ResetTokenRecord, Username};

use super::diesel_error_mapping::{corrupt_row, map_diesel_error, map_pool_error};
use super::models::NewResetTokenRow;
use super::pool::{DbPool, SqliteConn};
use super::schema::{pwreset_tokens, users};

/// Diesel-backed implementation of the `ResetTokenRepository` port.
#[derive(Clone)]
pub struct DieselResetTokenRepository {
    pool: DbPool,
}

impl DieselResetTokenRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn live_owner(
    conn: &mut SqliteConn,
    hash: &str,
    now: i64,
) -> QueryResult<Option<String>> {
    pwreset_tokens::table
        .filter(pwreset_tokens::hash.eq(hash))
        .filter(pwreset_tokens::expiry.gt(now))
        .select(pwreset_tokens::username)
        .first::<String>(conn)
        .await
        .optional()
}

fn owner(raw: Option<String>) -> Result<Option<Username>, PersistenceError> {
    raw.map(Username::new)
        .transpose()
        .map_err(|err| corrupt_row("pwreset_tokens", err))
}

fn removed_count(removed: usize) -> u64 {
    u64::try_from(removed).unwrap_or(u64::MAX)
}

#[async_trait]
impl ResetTokenRepository for DieselResetTokenRepository {
    async fn replace_for_user(&self, record: &ResetTokenRecord) -> Result<(), PersistenceError> {
        let row = NewResetTokenRow {
            hash: record.hash.as_str(),
            username: record.username.as_ref(),
            expiry: record.expiry.timestamp(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let superseded = diesel::delete(
                    pwreset_tokens::table.filter(pwreset_tokens::username.eq(row.username)),
                )
                .execute(conn)
                .await?;
                diesel::insert_into(pwreset_tokens::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                debug!(username = row.username, superseded, "reset token stored");
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_live(
        &self,
        hash: &ResetTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<Username>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw = live_owner(&mut conn, hash.as_str(), now.timestamp())
            .await
            .map_err(map_diesel_error)?;
        owner(raw)
    }

    async fn delete_for_user(&self, username: &Username) -> Result<u64, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed =
            diesel::delete(pwreset_tokens::table.filter(pwreset_tokens::username.eq(username.as_ref())))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        Ok(removed_count(removed))
    }

    async fn redeem(
        &self,
        hash: &ResetTokenHash,
        now: DateTime<Utc>,
        new_password: &PasswordHash,
    ) -> Result<Option<Username>, PersistenceError> {
        let hash = hash.as_str();
        let password = new_password.expose();
        let now = now.timestamp();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw = conn
            .transaction(|conn| {
                async move {
                    let Some(username) = live_owner(conn, hash, now).await? else {
                        return Ok(None);
                    };
                    diesel::update(users::table.find(username.as_str()))
                        .set(users::password.eq(password))
                        .execute(conn)
                        .await?;
                    diesel::delete(
                        pwreset_tokens::table.filter(pwreset_tokens::username.eq(username.as_str())),
                    )
                    .execute(conn)
                    .await?;
                    Ok(Some(username))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        owner(raw)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            pwreset_tokens::table.filter(pwreset_tokens::expiry.le(now.timestamp())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed_count(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn stored_owner_is_revalidated() {
        let err = owner(Some(String::new())).expect_err("empty username");
        assert!(err.is_query());
    }

    #[rstest]
    fn absent_owner_stays_absent() {
        assert_eq!(owner(None).expect("no row"), None);
    }
}
