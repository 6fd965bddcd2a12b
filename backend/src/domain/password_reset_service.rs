//! Password reset token lifecycle.
//!
//! Tokens are single use and short lived. Issuing a token supersedes every
//! earlier token for the user; redeeming one deletes them all and signs the
//! user out everywhere except the session that asked to stay.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use mockable::Clock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::ports::{PersistenceError, ResetTokenRepository, SessionInvalidator};
use super::service_support::{persistence_failure, session_failure};
use super::{
    Error, PasswordHash, RequestContext, ResetTokenPlaintext, ResetTokenRecord, Username,
};

/// Default lifetime of an issued token, in minutes.
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 45;

/// Password reset service implementing the token driving operations.
pub struct PasswordResetService<R, S: ?Sized> {
    tokens: Arc<R>,
    sessions: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
}

impl<R, S: ?Sized> Clone for PasswordResetService<R, S> {
    fn clone(&self) -> Self {
        Self {
            tokens: Arc::clone(&self.tokens),
            sessions: Arc::clone(&self.sessions),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
        }
    }
}

impl<R, S: ?Sized> PasswordResetService<R, S> {
    /// Create a new service issuing tokens that live for `ttl`.
    pub fn new(tokens: Arc<R>, sessions: Arc<S>, clock: Arc<dyn Clock>, ttl: TimeDelta) -> Self {
        Self {
            tokens,
            sessions,
            clock,
            ttl,
        }
    }
}

impl<R, S> PasswordResetService<R, S>
where
    R: ResetTokenRepository,
    S: SessionInvalidator + ?Sized,
{
    /// Issue a fresh token for `username`, replacing any earlier ones.
    ///
    /// The plaintext is returned once for delivery; only its digest is
    /// stored.
    pub async fn issue_reset_token(
        &self,
        ctx: &RequestContext,
        username: &Username,
    ) -> Result<ResetTokenPlaintext, Error> {
        ctx.ensure_active()?;
        let plaintext = ResetTokenPlaintext::generate();
        let record = ResetTokenRecord {
            hash: plaintext.hash(),
            username: username.clone(),
            expiry: self.clock.utc() + self.ttl,
        };
        ctx.run(async {
            match self.tokens.replace_for_user(&record).await {
                Ok(()) => {
                    info!(%username, expiry = %record.expiry, "password reset token issued");
                    Ok(())
                }
                Err(PersistenceError::MissingReference { .. }) => {
                    Err(Error::not_found(format!("user {username} not found")))
                }
                Err(error) => Err(persistence_failure("issue_reset_token", error)),
            }
        })
        .await?;
        Ok(plaintext)
    }

    /// Owner of a live token, or `None` for unknown and expired tokens.
    pub async fn validate_reset_token(
        &self,
        ctx: &RequestContext,
        plaintext: &ResetTokenPlaintext,
    ) -> Result<Option<Username>, Error> {
        let hash = plaintext.hash();
        let now = self.clock.utc();
        ctx.run(async {
            self.tokens
                .find_live(&hash, now)
                .await
                .map_err(|error| persistence_failure("validate_reset_token", error))
        })
        .await
    }

    /// Delete every token of `username` and end their other sessions.
    pub async fn consume_reset_tokens(
        &self,
        ctx: &RequestContext,
        username: &Username,
        keep_session: Option<String>,
    ) -> Result<(), Error> {
        ctx.run(async {
            let removed = self
                .tokens
                .delete_for_user(username)
                .await
                .map_err(|error| persistence_failure("consume_reset_tokens", error))?;
            info!(%username, removed, "password reset tokens consumed");
            self.sessions
                .invalidate_all(username, keep_session)
                .await
                .map_err(session_failure)
        })
        .await
    }

    /// Redeem a token: store the new password hash, delete the owner's
    /// tokens, and sign them out of other sessions.
    ///
    /// The password change and token deletion commit together, so a token
    /// can never be redeemed twice.
    pub async fn reset_password(
        &self,
        ctx: &RequestContext,
        plaintext: &ResetTokenPlaintext,
        new_password: PasswordHash,
        keep_session: Option<String>,
    ) -> Result<Username, Error> {
        ctx.ensure_active()?;
        let hash = plaintext.hash();
        let now = self.clock.utc();
        ctx.run(async {
            let username = self
                .tokens
                .redeem(&hash, now, &new_password)
                .await
                .map_err(|error| persistence_failure("reset_password", error))?
                .ok_or_else(|| Error::not_found("reset token is invalid or has expired"))?;
            info!(%username, "password reset");
            self.sessions
                .invalidate_all(&username, keep_session)
                .await
                .map_err(session_failure)?;
            Ok(username)
        })
        .await
    }

    /// Delete every expired token. Returns the number removed.
    pub async fn reap_expired_tokens(&self, ctx: &RequestContext) -> Result<u64, Error> {
        let now = self.clock.utc();
        ctx.run(async {
            self.tokens
                .delete_expired(now)
                .await
                .map_err(|error| persistence_failure("reap_expired_tokens", error))
        })
        .await
    }
}

impl<R, S> PasswordResetService<R, S>
where
    R: ResetTokenRepository + 'static,
    S: SessionInvalidator + ?Sized + 'static,
{
    /// Reap expired tokens every `period` until `shutdown` fires.
    ///
    /// The first pass runs immediately. Failures are logged and retried on
    /// the next tick.
    pub fn spawn_token_reaper(
        &self,
        period: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        info!("token reaper stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        let ctx = RequestContext::with_token(shutdown.child_token());
                        match service.reap_expired_tokens(&ctx).await {
                            Ok(0) => {}
                            Ok(removed) => info!(removed, "expired reset tokens reaped"),
                            Err(error) => warn!(%error, "token reaper pass failed"),
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "password_reset_service_tests.rs"]
mod tests;
