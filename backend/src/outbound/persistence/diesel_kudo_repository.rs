//! SQLite-backed `KudoRepository` implementation using Diesel ORM.
//!
//! The upsert is one `INSERT .. ON CONFLICT (item_id, creator_username) DO
//! UPDATE .. RETURNING id` statement. The unique index turns a concurrent
//! duplicate insert into an update of the row that won, so a pair never has
//! two kudos.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{KudoRepository, PersistenceError};
use crate::domain::{ItemId, Kudo, KudoDraft, KudoId, UpsertOutcome, Username};

use super::diesel_error_mapping::{corrupt_row, map_diesel_error, map_pool_error};
use super::models::KudoRow;
use super::pool::DbPool;
use super::schema::kudos;

/// Diesel-backed implementation of the `KudoRepository` port.
#[derive(Clone)]
pub struct DieselKudoRepository {
    pool: DbPool,
}

impl DieselKudoRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn draft_row(draft: &KudoDraft, id: KudoId) -> KudoRow {
    KudoRow {
        id: id.to_string(),
        item_id: draft.item_id.to_string(),
        creator_username: draft.creator_username.to_string(),
        emoji: draft.emoji.key(),
        frame: draft.frame.key(),
        body: draft.body.to_string(),
    }
}

#[async_trait]
impl KudoRepository for DieselKudoRepository {
    async fn upsert(
        &self,
        draft: &KudoDraft,
        candidate_id: KudoId,
    ) -> Result<UpsertOutcome, PersistenceError> {
        let row = draft_row(draft, candidate_id);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored: String = diesel::insert_into(kudos::table)
            .values(&row)
            .on_conflict((kudos::item_id, kudos::creator_username))
            .do_update()
            .set((
                kudos::emoji.eq(excluded(kudos::emoji)),
                kudos::frame.eq(excluded(kudos::frame)),
                kudos::body.eq(excluded(kudos::body)),
            ))
            .returning(kudos::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let stored = KudoId::parse(&stored).map_err(|err| corrupt_row("kudos", err))?;
        let outcome = if stored == candidate_id {
            UpsertOutcome::Created(stored)
        } else {
            UpsertOutcome::Updated(stored)
        };
        debug!(kudo_id = %stored, created = outcome.is_created(), "kudo upserted");
        Ok(outcome)
    }

    async fn find_for(
        &self,
        item_id: &ItemId,
        creator: &Username,
    ) -> Result<Option<Kudo>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<KudoRow> = kudos::table
            .filter(kudos::item_id.eq(item_id.to_string()))
            .filter(kudos::creator_username.eq(creator.as_ref()))
            .select(KudoRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Kudo::try_from).transpose()
    }
}
