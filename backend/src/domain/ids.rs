//! Time-ordered identifiers for items and kudos.
//!
//! Identifiers are ULIDs: a 48-bit millisecond timestamp followed by 80 random
//! bits, rendered as 26 characters of Crockford base32. The text form sorts in
//! creation order, so the store orders feeds by id without a timestamp column.
//! Ids minted by this process come from one monotonic generator and therefore
//! never go backwards, even within a single millisecond.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use ulid::{Generator, Ulid};

/// Validation errors for identifier parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdValidationError {
    /// The input is not a 26-character ULID.
    #[error("{kind} id must be a valid ULID")]
    Invalid {
        /// Which identifier failed to parse.
        kind: &'static str,
    },
}

static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();

fn next_ulid() -> Ulid {
    let generator = GENERATOR.get_or_init(|| Mutex::new(Generator::new()));
    let mut guard = match generator.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match guard.generate() {
        Ok(id) => id,
        Err(error) => {
            tracing::warn!(%error, "monotonic ulid space exhausted; falling back to a fresh ulid");
            Ulid::new()
        }
    }
}

macro_rules! ulid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Ulid);

        impl $name {
            /// Mint a new identifier that sorts after every id previously
            /// minted by this process.
            pub fn generate() -> Self {
                Self(next_ulid())
            }

            /// Parse an identifier from its text form.
            pub fn parse(value: &str) -> Result<Self, IdValidationError> {
                Ulid::from_string(value.trim())
                    .map(Self)
                    .map_err(|_| IdValidationError::Invalid { kind: $kind })
            }

            /// Wrap an existing ULID.
            pub const fn from_ulid(id: Ulid) -> Self {
                Self(id)
            }

            /// Access the underlying ULID.
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Milliseconds since the Unix epoch encoded in the id.
            pub fn timestamp_ms(&self) -> u64 {
                self.0.timestamp_ms()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = IdValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }
    };
}

ulid_identifier!(
    /// Identifier of an item.
    ItemId,
    "item"
);

ulid_identifier!(
    /// Identifier of a kudo.
    KudoId,
    "kudo"
);
