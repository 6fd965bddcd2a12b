//! SQLite-backed `UserRepository` implementation using Diesel ORM.
//!
//! Covers account rows plus the two profile picture references. Picture
//! replacement is transactional so readers never observe one new variant
//! next to one old one.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{PersistenceError, UserRepository};
use crate::domain::{
    NewUser, PasswordHash, ProfilePicture, ProfilePictureKind, ProfileUpdate, User, UserSummary,
    Username,
};

use super::diesel_error_mapping::{corrupt_row, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, ProfileChangeset, ProfilePictureRow, UserRow};
use super::pool::DbPool;
use super::ranked_correlation::summaries_in_order;
use super::schema::{profile_pictures, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Assemble a picture from `(kind, filename)` rows; `None` unless both
/// variants are present.
fn picture_from_rows(rows: Vec<(i32, String)>) -> Option<ProfilePicture> {
    let mut large = None;
    let mut small = None;
    for (kind, filename) in rows {
        match ProfilePictureKind::from_i32(kind) {
            Some(ProfilePictureKind::Large) => large = Some(filename),
            Some(ProfilePictureKind::Small) => small = Some(filename),
            None => tracing::warn!(kind, "ignoring profile picture with unknown kind"),
        }
    }
    Some(ProfilePicture {
        large: large?,
        small: small?,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<(), PersistenceError> {
        let display_name = user.effective_display_name();
        let row = NewUserRow {
            username: user.username.as_ref(),
            displayname: display_name.as_ref(),
            email: user.email.as_ref().map(AsRef::as_ref),
            password: user.password_hash.expose(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find(&self, username: &Username) -> Result<Option<User>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(username.as_ref())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(User::try_from).transpose()
    }

    async fn summaries(
        &self,
        usernames: &[Username],
    ) -> Result<Vec<UserSummary>, PersistenceError> {
        summaries_in_order(&self.pool, usernames).await
    }

    async fn update_profile(
        &self,
        username: &Username,
        update: &ProfileUpdate,
    ) -> Result<bool, PersistenceError> {
        let changeset = ProfileChangeset {
            displayname: update.display_name.as_ref(),
            email: update.email.as_ref().map(AsRef::as_ref),
            bio: update.bio.as_ref(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(username.as_ref()))
            .set(&changeset)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<PasswordHash>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored: Option<String> = users::table
            .find(username.as_ref())
            .select(users::password)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        stored
            .map(|hash| PasswordHash::new(hash).map_err(|err| corrupt_row("users", err)))
            .transpose()
    }

    async fn set_password_hash(
        &self,
        username: &Username,
        hash: &PasswordHash,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(username.as_ref()))
            .set(users::password.eq(hash.expose()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn replace_profile_picture(
        &self,
        username: &Username,
        picture: &ProfilePicture,
    ) -> Result<Option<ProfilePicture>, PersistenceError> {
        let owner = username.as_ref();
        let rows = [ProfilePictureKind::Large, ProfilePictureKind::Small].map(|kind| {
            ProfilePictureRow {
                username: owner,
                kind: kind.as_i32(),
                filename: picture.filename(kind),
            }
        });
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let previous = conn
            .transaction(|conn| {
                async move {
                    let previous: Vec<(i32, String)> = profile_pictures::table
                        .filter(profile_pictures::username.eq(owner))
                        .select((profile_pictures::kind, profile_pictures::filename))
                        .load(conn)
                        .await?;
                    diesel::delete(
                        profile_pictures::table.filter(profile_pictures::username.eq(owner)),
                    )
                    .execute(conn)
                    .await?;
                    for row in &rows {
                        diesel::insert_into(profile_pictures::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    Ok(previous)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(picture_from_rows(previous))
    }

    async fn profile_picture(
        &self,
        username: &Username,
    ) -> Result<Option<ProfilePicture>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(i32, String)> = profile_pictures::table
            .filter(profile_pictures::username.eq(username.as_ref()))
            .select((profile_pictures::kind, profile_pictures::filename))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(picture_from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn picture_needs_both_variants() {
        assert_eq!(picture_from_rows(vec![(1, "small.jpg".to_owned())]), None);
    }

    #[rstest]
    fn picture_maps_kinds_to_variants() {
        let picture = picture_from_rows(vec![
            (1, "small.jpg".to_owned()),
            (0, "large.jpg".to_owned()),
            (7, "stray.jpg".to_owned()),
        ]);

        assert_eq!(
            picture,
            Some(ProfilePicture {
                large: "large.jpg".to_owned(),
                small: "small.jpg".to_owned(),
            })
        );
    }
}
