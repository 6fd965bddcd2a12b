//! Tests for the password reset service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    MockResetTokenRepository, MockSessionInvalidator, SessionInvalidationError,
};
use crate::test_support::MutableClock;

type Service = PasswordResetService<MockResetTokenRepository, MockSessionInvalidator>;

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn alice() -> Username {
    Username::new("alice").expect("valid username")
}

fn make_service(
    tokens: MockResetTokenRepository,
    sessions: MockSessionInvalidator,
    now: DateTime<Utc>,
) -> Service {
    PasswordResetService::new(
        Arc::new(tokens),
        Arc::new(sessions),
        Arc::new(MutableClock::new(now)),
        TimeDelta::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
    )
}

#[rstest]
#[tokio::test]
async fn issue_stores_only_the_digest(now: DateTime<Utc>) {
    let stored = Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&stored);
    let mut tokens = MockResetTokenRepository::new();
    tokens
        .expect_replace_for_user()
        .times(1)
        .returning(move |record| {
            *sink.lock().expect("record lock") = Some(record.clone());
            Ok(())
        });

    let service = make_service(tokens, MockSessionInvalidator::new(), now);
    let plaintext = service
        .issue_reset_token(&RequestContext::new(), &alice())
        .await
        .expect("issued");

    let record = stored
        .lock()
        .expect("record lock")
        .clone()
        .expect("record stored");
    assert_eq!(record.hash, plaintext.hash());
    assert_ne!(record.hash.as_str(), plaintext.expose());
    assert_eq!(record.username, alice());
    assert_eq!(record.expiry, now + TimeDelta::minutes(45));
}

#[rstest]
#[tokio::test]
async fn issue_for_unknown_user_is_not_found(now: DateTime<Utc>) {
    let mut tokens = MockResetTokenRepository::new();
    tokens
        .expect_replace_for_user()
        .times(1)
        .return_once(|_| Err(PersistenceError::missing_reference("users")));

    let service = make_service(tokens, MockSessionInvalidator::new(), now);
    let err = service
        .issue_reset_token(&RequestContext::new(), &Username::new("ghost").expect("valid"))
        .await
        .expect_err("unknown user");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn validate_checks_expiry_against_the_clock(now: DateTime<Utc>) {
    let plaintext = ResetTokenPlaintext::generate();
    let expected_hash = plaintext.hash();
    let mut tokens = MockResetTokenRepository::new();
    tokens
        .expect_find_live()
        .withf(move |hash, at| *hash == expected_hash && *at == now)
        .times(1)
        .return_once(|_, _| Ok(Some(alice())));

    let service = make_service(tokens, MockSessionInvalidator::new(), now);
    let owner = service
        .validate_reset_token(&RequestContext::new(), &plaintext)
        .await
        .expect("lookup succeeds");

    assert_eq!(owner, Some(alice()));
}

#[rstest]
#[tokio::test]
async fn invalid_token_does_not_touch_sessions(now: DateTime<Utc>) {
    let mut tokens = MockResetTokenRepository::new();
    tokens.expect_redeem().times(1).return_once(|_, _, _| Ok(None));
    let mut sessions = MockSessionInvalidator::new();
    sessions.expect_invalidate_all().never();

    let service = make_service(tokens, sessions, now);
    let err = service
        .reset_password(
            &RequestContext::new(),
            &ResetTokenPlaintext::from_user_input("NOPE"),
            PasswordHash::new("$2a$12$new").expect("valid hash"),
            None,
        )
        .await
        .expect_err("invalid token");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn reset_password_signs_out_other_sessions(now: DateTime<Utc>) {
    let mut tokens = MockResetTokenRepository::new();
    tokens
        .expect_redeem()
        .withf(|_, _, hash| hash.expose() == "$2a$12$new")
        .times(1)
        .return_once(|_, _, _| Ok(Some(alice())));
    let mut sessions = MockSessionInvalidator::new();
    sessions
        .expect_invalidate_all()
        .withf(|who, keep| *who == alice() && keep.as_deref() == Some("sess-1"))
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(tokens, sessions, now);
    let owner = service
        .reset_password(
            &RequestContext::new(),
            &ResetTokenPlaintext::generate(),
            PasswordHash::new("$2a$12$new").expect("valid hash"),
            Some("sess-1".to_owned()),
        )
        .await
        .expect("reset succeeds");

    assert_eq!(owner, alice());
}

#[rstest]
#[tokio::test]
async fn consume_reports_session_store_outage(now: DateTime<Utc>) {
    let mut tokens = MockResetTokenRepository::new();
    tokens
        .expect_delete_for_user()
        .times(1)
        .return_once(|_| Ok(1));
    let mut sessions = MockSessionInvalidator::new();
    sessions
        .expect_invalidate_all()
        .times(1)
        .return_once(|_, _| Err(SessionInvalidationError::unavailable("redis down")));

    let service = make_service(tokens, sessions, now);
    let err = service
        .consume_reset_tokens(&RequestContext::new(), &alice(), None)
        .await
        .expect_err("session outage");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn reap_deletes_up_to_now(now: DateTime<Utc>) {
    let mut tokens = MockResetTokenRepository::new();
    tokens
        .expect_delete_expired()
        .withf(move |at| *at == now)
        .times(1)
        .return_once(|_| Ok(4));

    let service = make_service(tokens, MockSessionInvalidator::new(), now);
    let removed = service
        .reap_expired_tokens(&RequestContext::new())
        .await
        .expect("reaped");

    assert_eq!(removed, 4);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn reaper_runs_each_period_until_shutdown(now: DateTime<Utc>) {
    let passes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&passes);
    let mut tokens = MockResetTokenRepository::new();
    tokens.expect_delete_expired().returning(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    });

    let service = make_service(tokens, MockSessionInvalidator::new(), now);
    let shutdown = CancellationToken::new();
    let handle = service.spawn_token_reaper(Duration::from_secs(60), shutdown.clone());

    tokio::time::sleep(Duration::from_secs(150)).await;
    shutdown.cancel();
    handle.await.expect("reaper exits cleanly");

    assert_eq!(passes.load(Ordering::SeqCst), 3);
}
