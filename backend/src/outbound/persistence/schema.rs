//! Diesel table definitions for the SQLite schema.
//!
//! These definitions must match `backend/migrations` exactly. The FTS5
//! virtual tables are declared with their implicit `rowid` key so inserts
//! and counts can use the query builder; `MATCH` queries go through
//! `sql_query`.

diesel::table! {
    /// Registered accounts. Usernames are immutable.
    users (username) {
        username -> Text,
        displayname -> Text,
        email -> Nullable<Text>,
        bio -> Text,
        /// Opaque hash produced by the credential collaborator.
        password -> Text,
    }
}

diesel::table! {
    /// Things users post so others can give them kudos.
    items (id) {
        /// ULID text.
        id -> Text,
        creator_username -> Text,
        name -> Text,
        description -> Text,
    }
}

diesel::table! {
    /// Reactions. `(item_id, creator_username)` is unique.
    kudos (id) {
        /// ULID text; newest-first feeds order by this column.
        id -> Text,
        item_id -> Text,
        creator_username -> Text,
        emoji -> Integer,
        frame -> Integer,
        body -> Text,
    }
}

diesel::table! {
    /// Directed follow edges: `username` follows `following_username`.
    users_following (username, following_username) {
        username -> Text,
        following_username -> Text,
    }
}

diesel::table! {
    profile_pictures (username, kind) {
        username -> Text,
        /// 0 for the large variant, 1 for the small one.
        kind -> Integer,
        filename -> Text,
    }
}

diesel::table! {
    /// Hashed password reset tokens.
    pwreset_tokens (hash) {
        hash -> Text,
        username -> Text,
        /// Unix seconds.
        expiry -> BigInt,
    }
}

diesel::table! {
    items_search (rowid) {
        rowid -> BigInt,
        id -> Text,
        name -> Text,
        description -> Text,
    }
}

diesel::table! {
    users_search (rowid) {
        rowid -> BigInt,
        /// Unindexed key column holding the username.
        id -> Text,
        username -> Text,
        displayname -> Text,
    }
}

diesel::table! {
    /// Completion markers for bulk search index builds.
    search_index_builds (name) {
        name -> Text,
        /// Unix seconds.
        built_at -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    items,
    kudos,
    users_following,
    profile_pictures,
    pwreset_tokens,
    items_search,
    users_search,
    search_index_builds,
);
