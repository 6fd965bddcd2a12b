//! Port abstraction for password reset token storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{PasswordHash, ResetTokenHash, ResetTokenRecord, Username};

use super::PersistenceError;

/// Hashed reset tokens, at most one live set per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// Delete every token for the record's user and insert the record, in
    /// one transaction.
    ///
    /// Fails with [`PersistenceError::MissingReference`] when the user does
    /// not exist.
    async fn replace_for_user(&self, record: &ResetTokenRecord) -> Result<(), PersistenceError>;

    /// Owner of the token with this hash, provided it expires after `now`.
    async fn find_live(
        &self,
        hash: &ResetTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<Username>, PersistenceError>;

    /// Delete every token belonging to `username`. Returns the number removed.
    async fn delete_for_user(&self, username: &Username) -> Result<u64, PersistenceError>;

    /// In one transaction: check the token is live, store the new password
    /// hash, and delete all of the owner's tokens. Returns the owner, or
    /// `None` when the token is unknown or expired.
    async fn redeem(
        &self,
        hash: &ResetTokenHash,
        now: DateTime<Utc>,
        new_password: &PasswordHash,
    ) -> Result<Option<Username>, PersistenceError>;

    /// Delete tokens whose expiry is at or before `now`. Returns the number
    /// removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, PersistenceError>;
}
