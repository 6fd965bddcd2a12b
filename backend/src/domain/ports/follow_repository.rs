//! Port abstraction for follow edges.

use async_trait::async_trait;

use crate::domain::{UserSummary, Username};

use super::PersistenceError;

/// Directed "follows" relation between users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Record that `follower` follows `followee`.
    ///
    /// Fails with [`PersistenceError::Duplicate`] when the edge exists and
    /// [`PersistenceError::MissingReference`] when either user is unknown.
    async fn follow(&self, follower: &Username, followee: &Username)
    -> Result<(), PersistenceError>;

    /// Remove the edge. Returns `false` when it did not exist.
    async fn unfollow(
        &self,
        follower: &Username,
        followee: &Username,
    ) -> Result<bool, PersistenceError>;

    /// Whether `follower` follows `followee`.
    async fn is_following(
        &self,
        follower: &Username,
        followee: &Username,
    ) -> Result<bool, PersistenceError>;

    /// Users following `username`, ordered by username.
    async fn followers(&self, username: &Username) -> Result<Vec<UserSummary>, PersistenceError>;

    /// Users that `username` follows, ordered by username.
    async fn following(&self, username: &Username) -> Result<Vec<UserSummary>, PersistenceError>;
}
