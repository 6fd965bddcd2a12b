//! Order-preserving correlation of ranked keys with their base rows.
//!
//! The search index returns keys in rank order. To attach full records
//! without losing that order, the keys are written to a temporary table
//! keyed by position, joined to the base table, and read back ordered by
//! position. Everything happens inside one transaction on one connection;
//! the temporary table is private to that connection and dropped before
//! commit.

use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::Sqlite;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::PersistenceError;
use crate::domain::{Item, SearchQuery, User, UserSummary, Username};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ItemRow, UserRow, UserSummaryRow};
use super::pool::{DbPool, SqliteConn};

diesel::table! {
    /// Connection-private scratch table; exists only inside a correlation
    /// transaction.
    ranked_ids (position) {
        position -> BigInt,
        id -> Text,
    }
}

const CREATE_RANKED_IDS: &str =
    "CREATE TEMP TABLE ranked_ids (position INTEGER PRIMARY KEY, id TEXT NOT NULL)";
const DROP_RANKED_IDS: &str = "DROP TABLE IF EXISTS temp.ranked_ids";

/// A base table whose rows can be fetched in the order of a key list.
pub(crate) trait OrderedLookup {
    /// Row read back from the correlation query.
    type Row: QueryableByName<Sqlite> + Send + 'static;
    /// Domain record produced from a row.
    type Record;

    /// Join of `temp.ranked_ids` with the base table, ordered by
    /// `ranked_ids.position`.
    const CORRELATE_SQL: &'static str;

    fn into_record(row: Self::Row) -> Result<Self::Record, PersistenceError>;
}

/// A base table with an FTS5 index over its text columns.
pub(crate) trait SearchTarget: OrderedLookup {
    /// Ranked key query. Binds the match expression, then the limit, and
    /// returns the key as `hit`.
    const MATCH_SQL: &'static str;
}

#[derive(QueryableByName)]
struct RankedHit {
    #[diesel(sql_type = Text)]
    hit: String,
}

/// Items ranked by name and description.
pub(crate) struct ItemSearch;

impl OrderedLookup for ItemSearch {
    type Row = ItemRow;
    type Record = Item;

    const CORRELATE_SQL: &'static str = "SELECT items.id AS id, \
        items.creator_username AS creator_username, items.name AS name, \
        items.description AS description \
        FROM temp.ranked_ids JOIN items ON items.id = ranked_ids.id \
        ORDER BY ranked_ids.position";

    fn into_record(row: Self::Row) -> Result<Self::Record, PersistenceError> {
        Item::try_from(row)
    }
}

impl SearchTarget for ItemSearch {
    const MATCH_SQL: &'static str = "SELECT id AS hit FROM items_search \
        WHERE items_search MATCH ? ORDER BY rank LIMIT ?";
}

/// Users ranked by username and display name.
pub(crate) struct UserSearch;

impl OrderedLookup for UserSearch {
    type Row = UserRow;
    type Record = User;

    const CORRELATE_SQL: &'static str = "SELECT users.username AS username, \
        users.displayname AS displayname, users.email AS email, users.bio AS bio \
        FROM temp.ranked_ids JOIN users ON users.username = ranked_ids.id \
        ORDER BY ranked_ids.position";

    fn into_record(row: Self::Row) -> Result<Self::Record, PersistenceError> {
        User::try_from(row)
    }
}

impl SearchTarget for UserSearch {
    const MATCH_SQL: &'static str = "SELECT id AS hit FROM users_search \
        WHERE users_search MATCH ? ORDER BY rank LIMIT ?";
}

/// Display labels for a caller-ordered list of usernames.
pub(crate) struct UserSummaries;

impl OrderedLookup for UserSummaries {
    type Row = UserSummaryRow;
    type Record = UserSummary;

    const CORRELATE_SQL: &'static str = "SELECT users.username AS username, \
        users.displayname AS displayname \
        FROM temp.ranked_ids JOIN users ON users.username = ranked_ids.id \
        ORDER BY ranked_ids.position";

    fn into_record(row: Self::Row) -> Result<Self::Record, PersistenceError> {
        UserSummary::try_from(row)
    }
}

async fn correlate<L: OrderedLookup>(
    conn: &mut SqliteConn,
    keys: &[String],
) -> QueryResult<Vec<L::Row>> {
    sql_query(DROP_RANKED_IDS).execute(conn).await?;
    sql_query(CREATE_RANKED_IDS).execute(conn).await?;

    for (position, key) in (0_i64..).zip(keys) {
        diesel::insert_into(ranked_ids::table)
            .values((
                ranked_ids::position.eq(position),
                ranked_ids::id.eq(key.as_str()),
            ))
            .execute(conn)
            .await?;
    }

    let rows = sql_query(L::CORRELATE_SQL).load::<L::Row>(conn).await?;
    sql_query(DROP_RANKED_IDS).execute(conn).await?;
    Ok(rows)
}

fn into_records<L: OrderedLookup>(rows: Vec<L::Row>) -> Result<Vec<L::Record>, PersistenceError> {
    rows.into_iter().map(L::into_record).collect()
}

/// Run a ranked search and return full records, best match first.
pub(crate) async fn ranked_search<T: SearchTarget>(
    pool: &DbPool,
    query: &SearchQuery,
    limit: u32,
) -> Result<Vec<T::Record>, PersistenceError> {
    let expression = query.match_expression();
    let limit = i64::from(limit);
    let mut conn = pool.get().await.map_err(map_pool_error)?;
    let rows = conn
        .transaction(|conn| {
            async move {
                let hits: Vec<RankedHit> = sql_query(T::MATCH_SQL)
                    .bind::<Text, _>(&expression)
                    .bind::<BigInt, _>(limit)
                    .load(conn)
                    .await?;
                if hits.is_empty() {
                    return Ok(Vec::new());
                }
                let keys: Vec<String> = hits.into_iter().map(|hit| hit.hit).collect();
                correlate::<T>(conn, &keys).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)?;
    into_records::<T>(rows)
}

/// Fetch summaries for `usernames` in the order given, skipping unknown ones.
pub(crate) async fn summaries_in_order(
    pool: &DbPool,
    usernames: &[Username],
) -> Result<Vec<UserSummary>, PersistenceError> {
    if usernames.is_empty() {
        return Ok(Vec::new());
    }
    let keys: Vec<String> = usernames.iter().map(ToString::to_string).collect();
    let mut conn = pool.get().await.map_err(map_pool_error)?;
    let rows = conn
        .transaction(|conn| {
            async move { correlate::<UserSummaries>(conn, &keys).await }.scope_boxed()
        })
        .await
        .map_err(map_diesel_error)?;
    into_records::<UserSummaries>(rows)
}
