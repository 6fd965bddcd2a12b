//! Shared Diesel error mapping for the SQLite adapters.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::PersistenceError;

use super::pool::PoolError;

/// Map pool errors into connection failures.
pub(crate) fn map_pool_error(error: PoolError) -> PersistenceError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    debug!(%message, "pool checkout failed");
    PersistenceError::connection(message)
}

/// Map Diesel errors into persistence categories.
///
/// Constraint violations keep their driver message so callers can log which
/// constraint fired; everything else gets a fixed message.
pub(crate) fn map_diesel_error(error: DieselError) -> PersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            %error,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            PersistenceError::duplicate(info.message())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            PersistenceError::missing_reference(info.message())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PersistenceError::connection("database connection error")
        }
        DieselError::NotFound => PersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => PersistenceError::query("database query error"),
        DieselError::DeserializationError(_) => {
            PersistenceError::query("stored row could not be decoded")
        }
        _ => PersistenceError::query("database error"),
    }
}

/// Map a stored value that no longer passes domain validation.
pub(crate) fn corrupt_row(table: &'static str, detail: impl std::fmt::Display) -> PersistenceError {
    debug!(table, %detail, "stored row failed validation");
    PersistenceError::query(format!("invalid row in {table}"))
}
