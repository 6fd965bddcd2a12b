//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the domain expects to interact with driven adapters.
//! Store-backed ports share [`PersistenceError`] so services map adapter
//! failures into the domain error taxonomy in one place.

mod macros;
pub(crate) use macros::define_port_error;

mod feed_query;
mod follow_repository;
mod item_repository;
mod kudo_repository;
mod persistence_error;
mod reset_token_repository;
mod search_repository;
mod session_invalidator;
mod stats_query;
mod user_repository;

#[cfg(test)]
pub use feed_query::MockFeedQuery;
pub use feed_query::FeedQuery;
#[cfg(test)]
pub use follow_repository::MockFollowRepository;
pub use follow_repository::FollowRepository;
#[cfg(test)]
pub use item_repository::MockItemRepository;
pub use item_repository::ItemRepository;
#[cfg(test)]
pub use kudo_repository::MockKudoRepository;
pub use kudo_repository::KudoRepository;
pub use persistence_error::PersistenceError;
#[cfg(test)]
pub use reset_token_repository::MockResetTokenRepository;
pub use reset_token_repository::ResetTokenRepository;
#[cfg(test)]
pub use search_repository::MockSearchRepository;
pub use search_repository::SearchRepository;
#[cfg(test)]
pub use session_invalidator::MockSessionInvalidator;
pub use session_invalidator::{SessionInvalidationError, SessionInvalidator};
#[cfg(test)]
pub use stats_query::MockStatsQuery;
pub use stats_query::StatsQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
