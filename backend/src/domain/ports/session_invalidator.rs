//! Port abstraction for ending a user's login sessions.
//!
//! Sessions live in the request-handling layer. The password reset flow only
//! needs a way to tell that layer to drop them.

use async_trait::async_trait;

use crate::domain::Username;

use super::define_port_error;

define_port_error! {
    /// Errors raised while invalidating sessions.
    pub enum SessionInvalidationError {
        /// The session store could not be reached.
        Unavailable { message: String } => "session store unavailable: {message}",
    }
}

/// Ends login sessions on behalf of the domain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionInvalidator: Send + Sync {
    /// End every session of `username` except `keep`, when given.
    async fn invalidate_all(
        &self,
        username: &Username,
        keep: Option<String>,
    ) -> Result<(), SessionInvalidationError>;
}
