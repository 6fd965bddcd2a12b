//! Password reset tokens.
//!
//! A token is 128 bits from the operating system CSPRNG, shown to the user
//! once as unpadded base32. Only its SHA-256 digest is stored.

use std::fmt;

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::Username;

/// Number of random bytes in a token.
pub const RESET_TOKEN_BYTES: usize = 16;

/// Plaintext token handed to the user. Zeroed on drop; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetTokenPlaintext(Zeroizing<String>);

impl ResetTokenPlaintext {
    /// Draw a fresh token from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; RESET_TOKEN_BYTES]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(Zeroizing::new(BASE32_NOPAD.encode(&bytes[..])))
    }

    /// Accept a token typed back by the user. Surrounding whitespace is
    /// dropped and letters are upper-cased, matching the base32 alphabet.
    pub fn from_user_input(raw: &str) -> Self {
        Self(Zeroizing::new(raw.trim().to_ascii_uppercase()))
    }

    /// Reveal the token for delivery to the user.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Digest stored in place of the plaintext.
    pub fn hash(&self) -> ResetTokenHash {
        ResetTokenHash(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for ResetTokenPlaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetTokenPlaintext(<redacted>)")
    }
}

/// Lowercase hex SHA-256 digest of a plaintext token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResetTokenHash(String);

impl ResetTokenHash {
    /// Wrap a digest read back from the store.
    pub fn from_stored(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    /// Digest text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Row persisted for an issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenRecord {
    pub hash: ResetTokenHash,
    pub username: Username,
    pub expiry: DateTime<Utc>,
}

impl ResetTokenRecord {
    /// Whether the token can still be redeemed at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }
}
