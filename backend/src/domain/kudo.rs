//! Kudos: one emoji-rated reaction per user per item.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DisplayName, ItemId, ItemName, KudoId, Username};

/// Number of emojis in the picker. Valid keys are `0..EMOJI_COUNT`.
pub const EMOJI_COUNT: i32 = 18;
/// Number of decorative frames. Valid keys are `0..FRAME_COUNT`.
pub const FRAME_COUNT: i32 = 8;
/// Maximum kudo body length in characters.
pub const KUDO_BODY_MAX: usize = 5000;

/// Validation errors for kudo input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KudoValidationError {
    #[error("invalid emoji payload")]
    MalformedEmoji,
    #[error("invalid emoji selected")]
    UnknownEmoji { key: i32 },
    #[error("invalid frame payload")]
    MalformedFrame,
    #[error("invalid frame selected")]
    UnknownFrame { key: i32 },
    #[error("body of kudo cannot be longer than {max} characters")]
    BodyTooLong { max: usize },
}

fn parse_key(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// Key into the fixed emoji table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Emoji(i32);

impl Emoji {
    /// Validate an emoji key.
    pub fn new(key: i32) -> Result<Self, KudoValidationError> {
        if (0..EMOJI_COUNT).contains(&key) {
            Ok(Self(key))
        } else {
            Err(KudoValidationError::UnknownEmoji { key })
        }
    }

    /// Parse a form value.
    pub fn parse(raw: &str) -> Result<Self, KudoValidationError> {
        parse_key(raw)
            .ok_or(KudoValidationError::MalformedEmoji)
            .and_then(Self::new)
    }

    /// Integer key persisted in the store.
    pub const fn key(self) -> i32 {
        self.0
    }
}

/// Key into the fixed frame table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Frame(i32);

impl Frame {
    /// Validate a frame key.
    pub fn new(key: i32) -> Result<Self, KudoValidationError> {
        if (0..FRAME_COUNT).contains(&key) {
            Ok(Self(key))
        } else {
            Err(KudoValidationError::UnknownFrame { key })
        }
    }

    /// Parse a form value.
    pub fn parse(raw: &str) -> Result<Self, KudoValidationError> {
        parse_key(raw)
            .ok_or(KudoValidationError::MalformedFrame)
            .and_then(Self::new)
    }

    /// Integer key persisted in the store.
    pub const fn key(self) -> i32 {
        self.0
    }
}

macro_rules! key_impls {
    ($($name:ident),*) => {
        $(
            impl TryFrom<i32> for $name {
                type Error = KudoValidationError;

                fn try_from(value: i32) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$name> for i32 {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

key_impls!(Emoji, Frame);

/// Optional free-text message attached to a kudo.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KudoBody(String);

impl KudoBody {
    /// Validate and construct a [`KudoBody`].
    pub fn new(body: impl Into<String>) -> Result<Self, KudoValidationError> {
        let body = body.into();
        if body.chars().count() > KUDO_BODY_MAX {
            return Err(KudoValidationError::BodyTooLong { max: KUDO_BODY_MAX });
        }
        Ok(Self(body))
    }
}

impl AsRef<str> for KudoBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for KudoBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<KudoBody> for String {
    fn from(value: KudoBody) -> Self {
        value.0
    }
}

impl TryFrom<String> for KudoBody {
    type Error = KudoValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validated reaction ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KudoDraft {
    pub item_id: ItemId,
    pub creator_username: Username,
    pub emoji: Emoji,
    pub frame: Frame,
    pub body: KudoBody,
}

impl KudoDraft {
    /// Validate raw form input into a draft.
    ///
    /// Emoji is checked first, then frame, then body, so the first reported
    /// error matches the order fields appear in the form.
    pub fn from_form(
        item_id: ItemId,
        creator_username: Username,
        emoji: &str,
        frame: &str,
        body: impl Into<String>,
    ) -> Result<Self, KudoValidationError> {
        Ok(Self {
            item_id,
            creator_username,
            emoji: Emoji::parse(emoji)?,
            frame: Frame::parse(frame)?,
            body: KudoBody::new(body)?,
        })
    }
}

/// Stored reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kudo {
    pub id: KudoId,
    pub item_id: ItemId,
    pub creator_username: Username,
    pub emoji: Emoji,
    pub frame: Frame,
    pub body: KudoBody,
}

/// Result of an upsert: whether the pair was new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No kudo existed for the pair; a new row was written.
    Created(KudoId),
    /// The pair already had a kudo; it was updated in place.
    Updated(KudoId),
}

impl UpsertOutcome {
    /// Identifier of the stored kudo.
    pub const fn id(self) -> KudoId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }

    /// True when a new row was written.
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Kudo joined with the display data a feed renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: KudoId,
    pub item_id: ItemId,
    pub item_name: ItemName,
    pub creator_username: Username,
    pub creator_display_name: DisplayName,
    /// Filename of the creator's small profile picture, if they set one.
    pub creator_picture: Option<String>,
    pub frame: Frame,
    pub emoji: Emoji,
    pub body: KudoBody,
}
