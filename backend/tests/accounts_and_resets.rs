//! Integration tests for accounts, follows, and password reset tokens.

use std::time::Duration;

use kudoer::domain::{ErrorCode, PasswordHash, ProfilePicture, ResetTokenPlaintext};
use rstest::rstest;
use tokio_util::sync::CancellationToken;

mod support;

use support::{TestStore, username};

fn new_hash(raw: &str) -> PasswordHash {
    PasswordHash::new(raw).expect("valid hash")
}

#[rstest]
#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let store = TestStore::open(20).await;
    store.register("alice", "Alice").await;

    let err = store
        .store
        .users
        .create_user(
            &store.ctx(),
            kudoer::domain::NewUser {
                username: username("alice"),
                display_name: None,
                email: None,
                password_hash: new_hash("$2a$12$other"),
            },
        )
        .await
        .expect_err("taken");

    assert_eq!(err.code(), ErrorCode::AlreadyExists);
}

#[rstest]
#[tokio::test]
async fn follow_graph_round_trips() {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    let bob = store.register("bob", "Bob").await;
    let carol = store.register("carol", "Carol").await;
    let users = &store.store.users;

    users.follow(&ctx, &alice, &bob).await.expect("follow");
    users.follow(&ctx, &carol, &bob).await.expect("follow");
    let again = users.follow(&ctx, &alice, &bob).await.expect_err("duplicate");
    let itself = users.follow(&ctx, &alice, &alice).await.expect_err("self");
    let ghost = users
        .follow(&ctx, &alice, &username("ghost"))
        .await
        .expect_err("unknown");

    assert_eq!(again.code(), ErrorCode::AlreadyExists);
    assert_eq!(itself.code(), ErrorCode::InvalidRequest);
    assert_eq!(ghost.code(), ErrorCode::NotFound);

    let followers: Vec<_> = users
        .followers(&ctx, &bob)
        .await
        .expect("followers")
        .into_iter()
        .map(|summary| summary.username)
        .collect();
    assert_eq!(followers, vec![alice.clone(), carol]);
    assert!(users.is_following(&ctx, &alice, &bob).await.expect("lookup"));

    users.unfollow(&ctx, &alice, &bob).await.expect("unfollow");
    users.unfollow(&ctx, &alice, &bob).await.expect("repeat is a no-op");
    assert!(!users.is_following(&ctx, &alice, &bob).await.expect("lookup"));
}

#[rstest]
#[tokio::test]
async fn summaries_follow_the_requested_order() {
    let store = TestStore::open(20).await;
    let alice = store.register("alice", "Alice").await;
    let bob = store.register("bob", "Bob").await;
    let carol = store.register("carol", "Carol").await;

    let summaries = store
        .store
        .users
        .user_summaries(
            &store.ctx(),
            &[carol.clone(), username("ghost"), alice.clone(), bob.clone()],
        )
        .await
        .expect("summaries load");

    let labels: Vec<_> = summaries
        .iter()
        .map(|summary| (summary.username.clone(), summary.display_name.to_string()))
        .collect();
    assert_eq!(
        labels,
        vec![
            (carol, "Carol".to_owned()),
            (alice, "Alice".to_owned()),
            (bob, "Bob".to_owned()),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn replacing_a_picture_returns_the_old_files() {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    let users = &store.store.users;
    let first = ProfilePicture {
        large: "a-512.jpg".to_owned(),
        small: "a-128.jpg".to_owned(),
    };
    let second = ProfilePicture {
        large: "b-512.jpg".to_owned(),
        small: "b-128.jpg".to_owned(),
    };

    let none = users
        .set_profile_picture(&ctx, &alice, first.clone())
        .await
        .expect("stored");
    let replaced = users
        .set_profile_picture(&ctx, &alice, second.clone())
        .await
        .expect("stored");

    assert_eq!(none, None);
    assert_eq!(replaced, Some(first));
    assert_eq!(
        users.profile_picture(&ctx, &alice).await.expect("loads"),
        Some(second)
    );
}

#[rstest]
#[tokio::test]
async fn reset_tokens_are_single_use() {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    let resets = &store.store.password_resets;

    let token = resets
        .issue_reset_token(&ctx, &alice)
        .await
        .expect("token issued");
    let typed = ResetTokenPlaintext::from_user_input(&token.expose().to_ascii_lowercase());
    assert_eq!(
        resets.validate_reset_token(&ctx, &typed).await.expect("lookup"),
        Some(alice.clone())
    );

    let owner = resets
        .reset_password(&ctx, &typed, new_hash("$2a$12$fresh"), Some("sess-1".to_owned()))
        .await
        .expect("reset succeeds");
    assert_eq!(owner, alice);
    assert_eq!(
        store
            .store
            .users
            .password_hash(&ctx, &alice)
            .await
            .expect("hash loads")
            .expose(),
        "$2a$12$fresh"
    );
    assert_eq!(
        store.sessions.calls(),
        vec![(alice.clone(), Some("sess-1".to_owned()))]
    );

    let replay = resets
        .reset_password(&ctx, &token, new_hash("$2a$12$again"), None)
        .await
        .expect_err("token already used");
    assert_eq!(replay.code(), ErrorCode::NotFound);
    assert_eq!(
        resets.validate_reset_token(&ctx, &token).await.expect("lookup"),
        None
    );
}

#[rstest]
#[tokio::test]
async fn a_newer_token_supersedes_the_older_one() {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    let resets = &store.store.password_resets;

    let older = resets.issue_reset_token(&ctx, &alice).await.expect("issued");
    let newer = resets.issue_reset_token(&ctx, &alice).await.expect("issued");

    assert_eq!(resets.validate_reset_token(&ctx, &older).await.expect("lookup"), None);
    assert_eq!(
        resets.validate_reset_token(&ctx, &newer).await.expect("lookup"),
        Some(alice)
    );
}

#[rstest]
#[case(44 * 60, true)]
#[case(45 * 60, false)]
#[case(46 * 60, false)]
#[tokio::test]
async fn tokens_expire_after_their_lifetime(#[case] elapsed_secs: i64, #[case] live: bool) {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    let resets = &store.store.password_resets;
    let token = resets.issue_reset_token(&ctx, &alice).await.expect("issued");

    store.clock.advance_seconds(elapsed_secs);

    let owner = resets.validate_reset_token(&ctx, &token).await.expect("lookup");
    assert_eq!(owner.is_some(), live);
}

#[rstest]
#[tokio::test]
async fn unknown_users_cannot_request_tokens() {
    let store = TestStore::open(20).await;

    let err = store
        .store
        .password_resets
        .issue_reset_token(&store.ctx(), &username("ghost"))
        .await
        .expect_err("no such user");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn consuming_tokens_signs_the_user_out() {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    let resets = &store.store.password_resets;
    let token = resets.issue_reset_token(&ctx, &alice).await.expect("issued");

    resets
        .consume_reset_tokens(&ctx, &alice, None)
        .await
        .expect("consumed");

    assert_eq!(resets.validate_reset_token(&ctx, &token).await.expect("lookup"), None);
    assert_eq!(store.sessions.calls(), vec![(alice, None)]);
}

#[rstest]
#[tokio::test]
async fn reaper_removes_only_expired_tokens() {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    let bob = store.register("bob", "Bob").await;
    let resets = &store.store.password_resets;

    resets.issue_reset_token(&ctx, &alice).await.expect("issued");
    store.clock.advance_seconds(30 * 60);
    let bobs = resets.issue_reset_token(&ctx, &bob).await.expect("issued");
    store.clock.advance_seconds(20 * 60);

    let removed = resets.reap_expired_tokens(&ctx).await.expect("reaped");

    assert_eq!(removed, 1);
    assert_eq!(
        resets.validate_reset_token(&ctx, &bobs).await.expect("lookup"),
        Some(bob)
    );
}

#[rstest]
#[tokio::test]
async fn background_reaper_sweeps_then_stops_on_shutdown() {
    let store = TestStore::open(20).await;
    let ctx = store.ctx();
    let alice = store.register("alice", "Alice").await;
    store
        .store
        .password_resets
        .issue_reset_token(&ctx, &alice)
        .await
        .expect("issued");
    store.clock.advance_seconds(2 * 60 * 60);

    let shutdown = CancellationToken::new();
    let handle = store
        .store
        .password_resets
        .spawn_token_reaper(Duration::from_secs(3600), shutdown.clone());

    let mut remaining = stored_tokens(&store).await;
    for _ in 0..100 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = stored_tokens(&store).await;
    }
    assert_eq!(remaining, 0, "first sweep runs immediately");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("reaper stops promptly")
        .expect("reaper task joins");
}

async fn stored_tokens(store: &TestStore) -> i64 {
    use diesel::dsl::sql;
    use diesel::sql_types::BigInt;
    use diesel_async::RunQueryDsl;

    let mut conn = store.store.pool().get().await.expect("connection");
    diesel::select(sql::<BigInt>("(SELECT COUNT(*) FROM pwreset_tokens)"))
        .get_result(&mut conn)
        .await
        .expect("count loads")
}
