//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain records
//! re-validate every value, so a row edited outside the application surfaces
//! as a query failure instead of an invalid domain value.

use diesel::prelude::*;

use crate::domain::ports::PersistenceError;
use crate::domain::{
    Bio, DisplayName, Email, Emoji, FeedEntry, Frame, Item, ItemDescription, ItemId, ItemName,
    Kudo, KudoBody, KudoId, User, UserSummary, Username,
};

use super::diesel_error_mapping::corrupt_row;
use super::schema::{items, kudos, profile_pictures, pwreset_tokens, users};

/// Row struct for reading profile fields from the users table.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct UserRow {
    pub username: String,
    pub displayname: String,
    pub email: Option<String>,
    pub bio: String,
}

impl TryFrom<UserRow> for User {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            username: Username::new(row.username).map_err(|err| corrupt_row("users", err))?,
            display_name: DisplayName::new(row.displayname)
                .map_err(|err| corrupt_row("users", err))?,
            email: row
                .email
                .map(Email::new)
                .transpose()
                .map_err(|err| corrupt_row("users", err))?,
            bio: Bio::new(row.bio).map_err(|err| corrupt_row("users", err))?,
        })
    }
}

/// Username and display name pair for follower listings.
#[derive(Debug, Clone, Queryable, QueryableByName)]
#[diesel(table_name = users)]
pub(crate) struct UserSummaryRow {
    pub username: String,
    pub displayname: String,
}

impl TryFrom<UserSummaryRow> for UserSummary {
    type Error = PersistenceError;

    fn try_from(row: UserSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            username: Username::new(row.username).map_err(|err| corrupt_row("users", err))?,
            display_name: DisplayName::new(row.displayname)
                .map_err(|err| corrupt_row("users", err))?,
        })
    }
}

/// Insertable struct for registering users.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub displayname: &'a str,
    pub email: Option<&'a str>,
    pub password: &'a str,
}

/// Changeset for the editable profile fields. A cleared email is written
/// as NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProfileChangeset<'a> {
    pub displayname: &'a str,
    pub email: Option<&'a str>,
    pub bio: &'a str,
}

/// Row struct for the items table, used for reads and inserts.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct ItemRow {
    pub id: String,
    pub creator_username: String,
    pub name: String,
    pub description: String,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            creator_username: item.creator_username.to_string(),
            name: item.name.to_string(),
            description: item.description.to_string(),
        }
    }
}

impl TryFrom<ItemRow> for Item {
    type Error = PersistenceError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ItemId::parse(&row.id).map_err(|err| corrupt_row("items", err))?,
            creator_username: Username::new(row.creator_username)
                .map_err(|err| corrupt_row("items", err))?,
            name: ItemName::new(row.name).map_err(|err| corrupt_row("items", err))?,
            description: ItemDescription::new(row.description)
                .map_err(|err| corrupt_row("items", err))?,
        })
    }
}

/// Row struct for the kudos table, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kudos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct KudoRow {
    pub id: String,
    pub item_id: String,
    pub creator_username: String,
    pub emoji: i32,
    pub frame: i32,
    pub body: String,
}

impl TryFrom<KudoRow> for Kudo {
    type Error = PersistenceError;

    fn try_from(row: KudoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: KudoId::parse(&row.id).map_err(|err| corrupt_row("kudos", err))?,
            item_id: ItemId::parse(&row.item_id).map_err(|err| corrupt_row("kudos", err))?,
            creator_username: Username::new(row.creator_username)
                .map_err(|err| corrupt_row("kudos", err))?,
            emoji: Emoji::new(row.emoji).map_err(|err| corrupt_row("kudos", err))?,
            frame: Frame::new(row.frame).map_err(|err| corrupt_row("kudos", err))?,
            body: KudoBody::new(row.body).map_err(|err| corrupt_row("kudos", err))?,
        })
    }
}

/// Kudo joined with its item name, creator display name, and small picture.
///
/// Field order matches the feed selection tuple.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct FeedRow {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub creator_username: String,
    pub creator_displayname: String,
    pub creator_picture: Option<String>,
    pub frame: i32,
    pub emoji: i32,
    pub body: String,
}

impl TryFrom<FeedRow> for FeedEntry {
    type Error = PersistenceError;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        let corrupt = |err: &dyn std::fmt::Display| corrupt_row("kudos", err);
        Ok(Self {
            id: KudoId::parse(&row.id).map_err(|err| corrupt(&err))?,
            item_id: ItemId::parse(&row.item_id).map_err(|err| corrupt(&err))?,
            item_name: ItemName::new(row.item_name).map_err(|err| corrupt(&err))?,
            creator_username: Username::new(row.creator_username).map_err(|err| corrupt(&err))?,
            creator_display_name: DisplayName::new(row.creator_displayname)
                .map_err(|err| corrupt(&err))?,
            creator_picture: row.creator_picture,
            frame: Frame::new(row.frame).map_err(|err| corrupt(&err))?,
            emoji: Emoji::new(row.emoji).map_err(|err| corrupt(&err))?,
            body: KudoBody::new(row.body).map_err(|err| corrupt(&err))?,
        })
    }
}

/// Insertable struct for one profile picture variant.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profile_pictures)]
pub(crate) struct ProfilePictureRow<'a> {
    pub username: &'a str,
    pub kind: i32,
    pub filename: &'a str,
}

/// Insertable struct for an issued reset token.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pwreset_tokens)]
pub(crate) struct NewResetTokenRow<'a> {
    pub hash: &'a str,
    pub username: &'a str,
    pub expiry: i64,
}
