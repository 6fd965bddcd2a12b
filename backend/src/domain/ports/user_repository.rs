//! Port abstraction for user account persistence.

use async_trait::async_trait;

use crate::domain::{
    NewUser, PasswordHash, ProfilePicture, ProfileUpdate, User, UserSummary, Username,
};

use super::PersistenceError;

/// Reads and writes user accounts and their profile picture references.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// Fails with [`PersistenceError::Duplicate`] when the username is taken.
    async fn insert(&self, user: &NewUser) -> Result<(), PersistenceError>;

    /// Fetch a user's profile.
    async fn find(&self, username: &Username) -> Result<Option<User>, PersistenceError>;

    /// Fetch display labels for several users, in the order given.
    ///
    /// Unknown usernames are skipped.
    async fn summaries(
        &self,
        usernames: &[Username],
    ) -> Result<Vec<UserSummary>, PersistenceError>;

    /// Overwrite the editable profile fields. Returns `false` when the user
    /// does not exist.
    async fn update_profile(
        &self,
        username: &Username,
        update: &ProfileUpdate,
    ) -> Result<bool, PersistenceError>;

    /// Stored password hash, for the credential collaborator to verify.
    async fn password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<PasswordHash>, PersistenceError>;

    /// Replace the stored password hash. Returns `false` when the user does
    /// not exist.
    async fn set_password_hash(
        &self,
        username: &Username,
        hash: &PasswordHash,
    ) -> Result<bool, PersistenceError>;

    /// Replace both profile picture variants, returning the previous ones so
    /// the media collaborator can delete the files.
    async fn replace_profile_picture(
        &self,
        username: &Username,
        picture: &ProfilePicture,
    ) -> Result<Option<ProfilePicture>, PersistenceError>;

    /// Current profile picture, if both variants are set.
    async fn profile_picture(
        &self,
        username: &Username,
    ) -> Result<Option<ProfilePicture>, PersistenceError>;
}
