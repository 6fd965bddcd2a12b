//! Domain primitives, ports, and services.
//!
//! Purpose: Define strongly typed records for users, items, kudos, and reset
//! tokens, the ports the persistence adapters implement, and the services the
//! request-handling layer drives. Validation lives in the value types so an
//! invalid value never reaches a port.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - RequestContext: cancellation and deadline for one request.
//! - User, Item, Kudo, FeedEntry: records returned by the services.
//! - UserService, ItemService, SearchService, KudoService, FeedService,
//!   PasswordResetService, StatsService: driving operations.

pub mod context;
pub mod error;
pub mod feed_service;
pub mod ids;
pub mod item;
pub mod item_service;
pub mod kudo;
pub mod kudo_service;
pub mod password_reset_service;
pub mod ports;
pub mod reset_token;
pub mod search;
pub mod search_service;
mod service_support;
pub mod stats;
pub mod stats_service;
pub mod user;
pub mod user_service;

pub use self::context::RequestContext;
pub use self::error::{Error, ErrorCode};
pub use self::feed_service::{DEFAULT_PAGE_SIZE, FeedService};
pub use self::ids::{IdValidationError, ItemId, KudoId};
pub use self::item::{
    ITEM_DESCRIPTION_MAX, ITEM_NAME_MAX, Item, ItemDescription, ItemName, ItemValidationError,
    NewItem,
};
pub use self::item_service::ItemService;
pub use self::kudo::{
    EMOJI_COUNT, Emoji, FRAME_COUNT, FeedEntry, Frame, KUDO_BODY_MAX, Kudo, KudoBody, KudoDraft,
    KudoValidationError, UpsertOutcome,
};
pub use self::kudo_service::KudoService;
pub use self::password_reset_service::{DEFAULT_RESET_TOKEN_TTL_MINUTES, PasswordResetService};
pub use self::reset_token::{
    RESET_TOKEN_BYTES, ResetTokenHash, ResetTokenPlaintext, ResetTokenRecord,
};
pub use self::search::{MAX_QUERY_TOKENS, SearchQuery};
pub use self::search_service::{DEFAULT_SEARCH_LIMIT, SearchService};
pub use self::stats::StoreStats;
pub use self::stats_service::StatsService;
pub use self::user::{
    BIO_MAX, Bio, DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX_EXCLUSIVE, Email, NewUser,
    PasswordHash, ProfilePicture, ProfilePictureKind, ProfileUpdate, USERNAME_MAX, User,
    UserSummary, UserValidationError, Username,
};
pub use self::user_service::UserService;

/// Convenient service result alias.
///
/// # Examples
/// ```
/// use kudoer::domain::{Error, ServiceResult};
///
/// fn lookup() -> ServiceResult<()> {
///     Err(Error::not_found("no such item"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ServiceResult<T> = Result<T, Error>;
