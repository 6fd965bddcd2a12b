//! User data model.
//!
//! Usernames are the identity key of every user-owned row. They are
//! immutable once registered, so the validated [`Username`] newtype is the
//! only way to reach the store with one.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum username length in characters.
pub const USERNAME_MAX: usize = 30;
/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 30;
/// Emails must be strictly shorter than this many bytes.
pub const EMAIL_MAX_EXCLUSIVE: usize = 254;
/// Maximum bio length in characters.
pub const BIO_MAX: usize = 1000;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    EmptyDisplayName,
    DisplayNameTooLong { max: usize },
    EmptyEmail,
    EmailTooLong,
    EmailInvalid,
    BioTooLong { max: usize },
    EmptyPasswordHash,
    SelfFollow,
}

impl UserValidationError {
    /// Name of the input field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername | Self::UsernameTooLong { .. } | Self::UsernameInvalidCharacters => {
                "username"
            }
            Self::EmptyDisplayName | Self::DisplayNameTooLong { .. } => "displayname",
            Self::EmptyEmail | Self::EmailTooLong | Self::EmailInvalid => "email",
            Self::BioTooLong { .. } => "bio",
            Self::EmptyPasswordHash => "password",
            Self::SelfFollow => "following",
        }
    }
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username cannot be blank"),
            Self::UsernameTooLong { max } => {
                write!(f, "username cannot be longer than {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain lowercase letters, numbers, hyphen, and underscore",
            ),
            Self::EmptyDisplayName => write!(f, "display name cannot be blank"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name cannot be longer than {max} characters")
            }
            Self::EmptyEmail => write!(f, "email cannot be blank"),
            Self::EmailTooLong => write!(f, "email is too long"),
            Self::EmailInvalid => write!(f, "email appears to be invalid"),
            Self::BioTooLong { max } => write!(f, "bio cannot be longer than {max} characters"),
            Self::EmptyPasswordHash => write!(f, "password hash must not be empty"),
            Self::SelfFollow => write!(f, "users cannot follow themselves"),
        }
    }
}

impl std::error::Error for UserValidationError {}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        Regex::new("^[a-z0-9_-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Unique, immutable account name.
///
/// # Examples
/// ```
/// use kudoer::domain::Username;
///
/// let username = Username::new("alice").expect("valid username");
/// assert_eq!(username.as_ref(), "alice");
/// assert!(Username::new("Alice").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        if username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

/// Human readable name shown next to a user's kudos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if display_name.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(display_name))
    }
}

impl From<&Username> for DisplayName {
    fn from(value: &Username) -> Self {
        // Every valid username is also a valid display name.
        Self(value.0.clone())
    }
}

/// Contact address used for password reset mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        if email.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if email.len() >= EMAIL_MAX_EXCLUSIVE {
            return Err(UserValidationError::EmailTooLong);
        }
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::EmailInvalid);
        }
        Ok(Self(email))
    }

    /// Parse an optional form value, treating blank input as absent.
    pub fn optional(raw: Option<&str>) -> Result<Option<Self>, UserValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Self::new(value).map(Some),
        }
    }
}

/// Free-text profile biography. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bio(String);

impl Bio {
    /// Validate and construct a [`Bio`].
    pub fn new(bio: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(bio.into())
    }

    fn from_owned(bio: String) -> Result<Self, UserValidationError> {
        if bio.chars().count() > BIO_MAX {
            return Err(UserValidationError::BioTooLong { max: BIO_MAX });
        }
        Ok(Self(bio))
    }
}

/// Pre-hashed password produced by the credential collaborator.
///
/// The store never sees a plaintext password. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an already hashed password.
    pub fn new(hash: impl Into<String>) -> Result<Self, UserValidationError> {
        let hash = hash.into();
        if hash.trim().is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        Ok(Self(hash))
    }

    /// Access the hash for storage or verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

macro_rules! string_value_impls {
    ($($name:ident),* $(,)?) => {
        $(
            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_ref())
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> Self {
                    value.0
                }
            }

            impl TryFrom<String> for $name {
                type Error = UserValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::from_owned(value)
                }
            }
        )*
    };
}

string_value_impls!(Username, DisplayName, Email, Bio);

/// Registered user as shown on profile pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: Username,
    pub display_name: DisplayName,
    pub email: Option<Email>,
    pub bio: Bio,
}

/// Username plus display name, as listed in follower views and search hits
/// that only need a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: Username,
    pub display_name: DisplayName,
}

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    /// Defaults to the username when absent.
    pub display_name: Option<DisplayName>,
    pub email: Option<Email>,
    pub password_hash: PasswordHash,
}

impl NewUser {
    /// Display name to store, falling back to the username.
    pub fn effective_display_name(&self) -> DisplayName {
        self.display_name
            .clone()
            .unwrap_or_else(|| DisplayName::from(&self.username))
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: DisplayName,
    pub email: Option<Email>,
    pub bio: Bio,
}

/// Size variant of a stored profile picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilePictureKind {
    /// 512 pixel JPEG shown on profile pages.
    Large,
    /// 128 pixel JPEG shown next to kudos.
    Small,
}

impl ProfilePictureKind {
    /// Integer key persisted in the `kind` column.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Large => 0,
            Self::Small => 1,
        }
    }

    /// Inverse of [`ProfilePictureKind::as_i32`].
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Large),
            1 => Some(Self::Small),
            _ => None,
        }
    }
}

/// Filenames of both picture variants, as handed over by the media
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePicture {
    pub large: String,
    pub small: String,
}

impl ProfilePicture {
    /// Filename for the given variant.
    pub fn filename(&self, kind: ProfilePictureKind) -> &str {
        match kind {
            ProfilePictureKind::Large => self.large.as_str(),
            ProfilePictureKind::Small => self.small.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Validation coverage for user value types.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice")]
    #[case("bob_2")]
    #[case("kota-nilsu")]
    #[case("abcdefghijklmnopqrstuvwxyz0123")]
    fn accepts_valid_usernames(#[case] raw: &str) {
        assert!(Username::new(raw).is_ok());
    }

    #[rstest]
    #[case("", UserValidationError::EmptyUsername)]
    #[case("Alice", UserValidationError::UsernameInvalidCharacters)]
    #[case("al ice", UserValidationError::UsernameInvalidCharacters)]
    #[case("ålice", UserValidationError::UsernameInvalidCharacters)]
    #[case(
        "abcdefghijklmnopqrstuvwxyz01234",
        UserValidationError::UsernameTooLong { max: USERNAME_MAX }
    )]
    fn rejects_invalid_usernames(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(Username::new(raw).expect_err("invalid"), expected);
    }

    #[rstest]
    fn display_name_counts_characters_not_bytes() {
        let name = "é".repeat(DISPLAY_NAME_MAX);
        assert!(DisplayName::new(name).is_ok());
        assert_eq!(
            DisplayName::new("é".repeat(DISPLAY_NAME_MAX + 1)).expect_err("too long"),
            UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            }
        );
    }

    #[rstest]
    fn display_name_defaults_to_username() {
        let new_user = NewUser {
            username: Username::new("alice").expect("valid"),
            display_name: None,
            email: None,
            password_hash: PasswordHash::new("$2a$12$hash").expect("valid"),
        };

        assert_eq!(new_user.effective_display_name().as_ref(), "alice");
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("   "), None)]
    #[case(Some("alice@example.com"), Some("alice@example.com"))]
    fn optional_email_treats_blank_as_absent(
        #[case] raw: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let parsed = Email::optional(raw).expect("valid email input");
        assert_eq!(parsed.as_ref().map(AsRef::as_ref), expected);
    }

    #[rstest]
    #[case("not-an-email", UserValidationError::EmailInvalid)]
    #[case("a@", UserValidationError::EmailInvalid)]
    fn rejects_malformed_email(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(Email::new(raw).expect_err("invalid"), expected);
    }

    #[rstest]
    fn rejects_overlong_email() {
        let raw = format!("{}@example.com", "a".repeat(EMAIL_MAX_EXCLUSIVE));
        assert_eq!(
            Email::new(raw).expect_err("too long"),
            UserValidationError::EmailTooLong
        );
    }

    #[rstest]
    fn bio_may_be_empty_but_bounded() {
        assert!(Bio::new("").is_ok());
        assert_eq!(
            Bio::new("x".repeat(BIO_MAX + 1)).expect_err("too long"),
            UserValidationError::BioTooLong { max: BIO_MAX }
        );
    }

    #[rstest]
    fn password_hash_debug_is_redacted() {
        let hash = PasswordHash::new("$2a$12$secret").expect("valid");
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }

    #[rstest]
    #[case(ProfilePictureKind::Large, 0)]
    #[case(ProfilePictureKind::Small, 1)]
    fn picture_kind_keys_are_stable(#[case] kind: ProfilePictureKind, #[case] key: i32) {
        assert_eq!(kind.as_i32(), key);
        assert_eq!(ProfilePictureKind::from_i32(key), Some(kind));
    }
}
