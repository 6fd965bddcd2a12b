//! Tests for the user service.

use std::sync::Arc;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{MockFollowRepository, MockUserRepository};
use rstest::{fixture, rstest};

fn username(raw: &str) -> Username {
    Username::new(raw).expect("valid username")
}

fn make_service(
    users: MockUserRepository,
    follows: MockFollowRepository,
) -> UserService<MockUserRepository, MockFollowRepository> {
    UserService::new(Arc::new(users), Arc::new(follows))
}

#[fixture]
fn new_user() -> NewUser {
    NewUser {
        username: username("alice"),
        display_name: None,
        email: None,
        password_hash: PasswordHash::new("$2a$12$fixture").expect("valid hash"),
    }
}

#[rstest]
#[tokio::test]
async fn create_user_reports_taken_username(new_user: NewUser) {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .times(1)
        .return_once(|_| Err(PersistenceError::duplicate("users.username")));

    let service = make_service(users, MockFollowRepository::new());
    let err = service
        .create_user(&RequestContext::new(), new_user)
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::AlreadyExists);
    assert_eq!(
        err.details(),
        Some(&serde_json::json!({ "field": "username" }))
    );
}

#[rstest]
#[tokio::test]
async fn cancelled_context_skips_the_insert(new_user: NewUser) {
    let mut users = MockUserRepository::new();
    users.expect_insert().never();

    let ctx = RequestContext::new();
    ctx.cancel();
    let service = make_service(users, MockFollowRepository::new());
    let err = service
        .create_user(&ctx, new_user)
        .await
        .expect_err("cancelled");

    assert_eq!(err.code(), ErrorCode::Cancelled);
}

#[rstest]
#[tokio::test]
async fn get_user_maps_missing_row_to_not_found() {
    let mut users = MockUserRepository::new();
    users.expect_find().times(1).return_once(|_| Ok(None));

    let service = make_service(users, MockFollowRepository::new());
    let err = service
        .get_user(&RequestContext::new(), &username("ghost"))
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_profile_of_unknown_user_is_not_found() {
    let mut users = MockUserRepository::new();
    users
        .expect_update_profile()
        .times(1)
        .return_once(|_, _| Ok(false));

    let service = make_service(users, MockFollowRepository::new());
    let update = ProfileUpdate {
        display_name: crate::domain::DisplayName::new("Ghost").expect("valid"),
        email: None,
        bio: crate::domain::Bio::default(),
    };
    let err = service
        .update_profile(&RequestContext::new(), &username("ghost"), update)
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn self_follow_is_rejected_before_the_store() {
    let mut follows = MockFollowRepository::new();
    follows.expect_follow().never();

    let service = make_service(MockUserRepository::new(), follows);
    let alice = username("alice");
    let err = service
        .follow(&RequestContext::new(), &alice, &alice)
        .await
        .expect_err("self follow");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(PersistenceError::duplicate("users_following"), ErrorCode::AlreadyExists)]
#[case(PersistenceError::missing_reference("users"), ErrorCode::NotFound)]
#[case(PersistenceError::connection("pool exhausted"), ErrorCode::ServiceUnavailable)]
#[tokio::test]
async fn follow_maps_store_outcomes(#[case] failure: PersistenceError, #[case] code: ErrorCode) {
    let mut follows = MockFollowRepository::new();
    follows
        .expect_follow()
        .times(1)
        .return_once(move |_, _| Err(failure));

    let service = make_service(MockUserRepository::new(), follows);
    let err = service
        .follow(&RequestContext::new(), &username("alice"), &username("bob"))
        .await
        .expect_err("store failure");

    assert_eq!(err.code(), code);
}

#[rstest]
#[tokio::test]
async fn unfollow_of_missing_edge_is_a_no_op() {
    let mut follows = MockFollowRepository::new();
    follows
        .expect_unfollow()
        .times(1)
        .return_once(|_, _| Ok(false));

    let service = make_service(MockUserRepository::new(), follows);
    service
        .unfollow(&RequestContext::new(), &username("alice"), &username("bob"))
        .await
        .expect("unfollow succeeds");
}

#[rstest]
#[tokio::test]
async fn blank_picture_filename_is_rejected() {
    let mut users = MockUserRepository::new();
    users.expect_replace_profile_picture().never();

    let service = make_service(users, MockFollowRepository::new());
    let err = service
        .set_profile_picture(
            &RequestContext::new(),
            &username("alice"),
            ProfilePicture {
                large: "large.jpg".to_owned(),
                small: " ".to_owned(),
            },
        )
        .await
        .expect_err("blank filename");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn set_profile_picture_returns_previous_files() {
    let previous = ProfilePicture {
        large: "old-512.jpg".to_owned(),
        small: "old-128.jpg".to_owned(),
    };
    let expected = previous.clone();
    let mut users = MockUserRepository::new();
    users
        .expect_replace_profile_picture()
        .times(1)
        .return_once(move |_, _| Ok(Some(previous)));

    let service = make_service(users, MockFollowRepository::new());
    let replaced = service
        .set_profile_picture(
            &RequestContext::new(),
            &username("alice"),
            ProfilePicture {
                large: "new-512.jpg".to_owned(),
                small: "new-128.jpg".to_owned(),
            },
        )
        .await
        .expect("picture stored");

    assert_eq!(replaced, Some(expected));
}

#[rstest]
#[tokio::test]
async fn empty_summary_lookup_skips_the_store() {
    let mut users = MockUserRepository::new();
    users.expect_summaries().never();

    let service = make_service(users, MockFollowRepository::new());
    let summaries = service
        .user_summaries(&RequestContext::new(), &[])
        .await
        .expect("empty lookup");

    assert!(summaries.is_empty());
}
