//! SQLite persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by a single SQLite file via the Diesel ORM, with async access
//! through `diesel-async`'s sync connection wrapper and `bb8` pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Derived search indexes**: FTS5 tables kept in step by triggers and
//!   populated in bulk by [`SearchIndexMaintenance`].
//! - **Strongly typed errors**: All database errors are mapped to
//!   [`crate::domain::ports::PersistenceError`].
//!
//! # Example
//!
//! ```ignore
//! use kudoer::outbound::persistence::{DbPool, PoolConfig, DieselUserRepository};
//!
//! run_migrations("/var/lib/kudoer/kudoer.db").await?;
//! let pool = DbPool::new(PoolConfig::new("/var/lib/kudoer/kudoer.db")).await?;
//! let repo = DieselUserRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_feed_query;
mod diesel_follow_repository;
mod diesel_item_repository;
mod diesel_kudo_repository;
mod diesel_reset_token_repository;
mod diesel_search_repository;
mod diesel_stats_query;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod ranked_correlation;
mod schema;
mod search_index_builder;

pub use diesel_feed_query::DieselFeedQuery;
pub use diesel_follow_repository::DieselFollowRepository;
pub use diesel_item_repository::DieselItemRepository;
pub use diesel_kudo_repository::DieselKudoRepository;
pub use diesel_reset_token_repository::DieselResetTokenRepository;
pub use diesel_search_repository::DieselSearchRepository;
pub use diesel_stats_query::DieselStatsQuery;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError, SqliteConn};
pub use search_index_builder::{
    DEFAULT_INDEX_BATCH_SIZE, IndexStatus, SearchIndexKind, SearchIndexMaintenance,
};
