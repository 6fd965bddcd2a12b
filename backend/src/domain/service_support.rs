//! Error translation shared by the domain services.

use tracing::error;

use super::ports::{PersistenceError, SessionInvalidationError};
use super::{
    Error, IdValidationError, ItemValidationError, KudoValidationError, UserValidationError,
};

/// Translate a store failure into a domain error.
///
/// Infrastructure faults are logged with the operation name and surface to
/// the caller with a generic message. Constraint outcomes are returned with
/// a neutral message; services that give them a specific meaning match on
/// them before falling back here.
pub(crate) fn persistence_failure(operation: &'static str, error: PersistenceError) -> Error {
    match error {
        PersistenceError::Connection { message } => {
            error!(operation, %message, "store unavailable");
            Error::service_unavailable("store temporarily unavailable")
        }
        PersistenceError::Query { message } => {
            error!(operation, %message, "store query failed");
            Error::internal("internal store error")
        }
        PersistenceError::Duplicate { .. } => Error::already_exists("record already exists"),
        PersistenceError::MissingReference { .. } => {
            Error::not_found("referenced record does not exist")
        }
    }
}

pub(crate) fn session_failure(error: SessionInvalidationError) -> Error {
    match error {
        SessionInvalidationError::Unavailable { message } => {
            error!(%message, "session invalidation failed");
            Error::service_unavailable("session store temporarily unavailable")
        }
    }
}

impl From<UserValidationError> for Error {
    fn from(value: UserValidationError) -> Self {
        Self::invalid_field(value.field(), value.to_string())
    }
}

impl From<ItemValidationError> for Error {
    fn from(value: ItemValidationError) -> Self {
        Self::invalid_field(value.field(), value.to_string())
    }
}

impl From<KudoValidationError> for Error {
    fn from(value: KudoValidationError) -> Self {
        Self::invalid_field("kudo", value.to_string())
    }
}

impl From<IdValidationError> for Error {
    fn from(value: IdValidationError) -> Self {
        Self::invalid_field("id", value.to_string())
    }
}
