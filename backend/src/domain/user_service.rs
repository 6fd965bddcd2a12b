//! User account, follow graph, and profile picture operations.

use std::sync::Arc;

use tracing::info;

use super::ports::{FollowRepository, PersistenceError, UserRepository};
use super::service_support::persistence_failure;
use super::{
    Email, Error, NewUser, PasswordHash, ProfilePicture, ProfileUpdate, RequestContext, User,
    UserSummary, UserValidationError, Username,
};

/// User service implementing the account driving operations.
#[derive(Clone)]
pub struct UserService<U, F> {
    users: Arc<U>,
    follows: Arc<F>,
}

impl<U, F> UserService<U, F> {
    /// Create a new service with the given repositories.
    pub fn new(users: Arc<U>, follows: Arc<F>) -> Self {
        Self { users, follows }
    }
}

fn user_not_found(username: &Username) -> Error {
    Error::not_found(format!("user {username} not found"))
}

impl<U, F> UserService<U, F>
where
    U: UserRepository,
    F: FollowRepository,
{
    /// Register a new account.
    ///
    /// A taken username is reported as [`super::ErrorCode::AlreadyExists`]
    /// against the `username` field.
    pub async fn create_user(&self, ctx: &RequestContext, user: NewUser) -> Result<(), Error> {
        ctx.run(async {
            match self.users.insert(&user).await {
                Ok(()) => {
                    info!(username = %user.username, "user registered");
                    Ok(())
                }
                Err(PersistenceError::Duplicate { .. }) => {
                    Err(Error::already_exists("username is already taken")
                        .with_details(serde_json::json!({ "field": "username" })))
                }
                Err(error) => Err(persistence_failure("create_user", error)),
            }
        })
        .await
    }

    /// Fetch a user's profile.
    pub async fn get_user(&self, ctx: &RequestContext, username: &Username) -> Result<User, Error> {
        ctx.run(async {
            self.users
                .find(username)
                .await
                .map_err(|error| persistence_failure("get_user", error))?
                .ok_or_else(|| user_not_found(username))
        })
        .await
    }

    /// Overwrite the editable profile fields.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        username: &Username,
        update: ProfileUpdate,
    ) -> Result<(), Error> {
        ctx.run(async {
            let updated = self
                .users
                .update_profile(username, &update)
                .await
                .map_err(|error| persistence_failure("update_profile", error))?;
            if updated {
                Ok(())
            } else {
                Err(user_not_found(username))
            }
        })
        .await
    }

    /// Contact address, if the user set one.
    pub async fn email(
        &self,
        ctx: &RequestContext,
        username: &Username,
    ) -> Result<Option<Email>, Error> {
        self.get_user(ctx, username).await.map(|user| user.email)
    }

    /// Stored password hash for the credential collaborator.
    pub async fn password_hash(
        &self,
        ctx: &RequestContext,
        username: &Username,
    ) -> Result<PasswordHash, Error> {
        ctx.run(async {
            self.users
                .password_hash(username)
                .await
                .map_err(|error| persistence_failure("password_hash", error))?
                .ok_or_else(|| user_not_found(username))
        })
        .await
    }

    /// Replace the stored password hash.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        username: &Username,
        hash: PasswordHash,
    ) -> Result<(), Error> {
        ctx.run(async {
            let updated = self
                .users
                .set_password_hash(username, &hash)
                .await
                .map_err(|error| persistence_failure("change_password", error))?;
            if updated {
                info!(%username, "password changed");
                Ok(())
            } else {
                Err(user_not_found(username))
            }
        })
        .await
    }

    /// Make `follower` follow `followee`.
    ///
    /// Following yourself is rejected. Following someone twice is reported
    /// as [`super::ErrorCode::AlreadyExists`].
    pub async fn follow(
        &self,
        ctx: &RequestContext,
        follower: &Username,
        followee: &Username,
    ) -> Result<(), Error> {
        if follower == followee {
            return Err(UserValidationError::SelfFollow.into());
        }
        ctx.run(async {
            match self.follows.follow(follower, followee).await {
                Ok(()) => Ok(()),
                Err(PersistenceError::Duplicate { .. }) => Err(Error::already_exists(format!(
                    "already following {followee}"
                ))),
                Err(PersistenceError::MissingReference { .. }) => {
                    Err(Error::not_found("user not found"))
                }
                Err(error) => Err(persistence_failure("follow", error)),
            }
        })
        .await
    }

    /// Remove a follow edge. Unfollowing someone you do not follow is a
    /// no-op.
    pub async fn unfollow(
        &self,
        ctx: &RequestContext,
        follower: &Username,
        followee: &Username,
    ) -> Result<(), Error> {
        ctx.run(async {
            self.follows
                .unfollow(follower, followee)
                .await
                .map(|_| ())
                .map_err(|error| persistence_failure("unfollow", error))
        })
        .await
    }

    /// Whether `follower` follows `followee`.
    pub async fn is_following(
        &self,
        ctx: &RequestContext,
        follower: &Username,
        followee: &Username,
    ) -> Result<bool, Error> {
        ctx.run(async {
            self.follows
                .is_following(follower, followee)
                .await
                .map_err(|error| persistence_failure("is_following", error))
        })
        .await
    }

    /// Display labels for `usernames`, in the order given. Unknown names are
    /// skipped.
    pub async fn user_summaries(
        &self,
        ctx: &RequestContext,
        usernames: &[Username],
    ) -> Result<Vec<UserSummary>, Error> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        ctx.run(async {
            self.users
                .summaries(usernames)
                .await
                .map_err(|error| persistence_failure("user_summaries", error))
        })
        .await
    }

    /// Users following `username`.
    pub async fn followers(
        &self,
        ctx: &RequestContext,
        username: &Username,
    ) -> Result<Vec<UserSummary>, Error> {
        ctx.run(async {
            self.follows
                .followers(username)
                .await
                .map_err(|error| persistence_failure("followers", error))
        })
        .await
    }

    /// Users that `username` follows.
    pub async fn following(
        &self,
        ctx: &RequestContext,
        username: &Username,
    ) -> Result<Vec<UserSummary>, Error> {
        ctx.run(async {
            self.follows
                .following(username)
                .await
                .map_err(|error| persistence_failure("following", error))
        })
        .await
    }

    /// Store new picture references and return the replaced ones, whose
    /// files the media collaborator should delete.
    pub async fn set_profile_picture(
        &self,
        ctx: &RequestContext,
        username: &Username,
        picture: ProfilePicture,
    ) -> Result<Option<ProfilePicture>, Error> {
        if picture.large.trim().is_empty() || picture.small.trim().is_empty() {
            return Err(Error::invalid_field("pic", "picture filename must not be empty"));
        }
        ctx.run(async {
            match self.users.replace_profile_picture(username, &picture).await {
                Err(PersistenceError::MissingReference { .. }) => Err(user_not_found(username)),
                other => other.map_err(|error| persistence_failure("set_profile_picture", error)),
            }
        })
        .await
    }

    /// Current profile picture references.
    pub async fn profile_picture(
        &self,
        ctx: &RequestContext,
        username: &Username,
    ) -> Result<Option<ProfilePicture>, Error> {
        ctx.run(async {
            self.users
                .profile_picture(username)
                .await
                .map_err(|error| persistence_failure("profile_picture", error))
        })
        .await
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
