//! Toggle semantics: exactly-once edges, counter agreement, direction
//! independence.

mod common;

use common::{seed_user, test_app};
use pulse_service::error::AppError;
use pulse_service::repository::{
    CounterTarget, EdgeKind, EdgeRepository, PostRepository, ToggleOutcome,
};

#[tokio::test]
async fn like_toggle_alternates_and_counter_follows() {
    let app = test_app();
    let author = seed_user(&app, "author").await;
    let fan = seed_user(&app, "fan").await;

    let post = app
        .state
        .content
        .create_post(author, None, None, "hello", false)
        .await
        .unwrap();

    for round in 1..=6 {
        let outcome = app.state.interactions.toggle_like(fan, post.id).await.unwrap();
        let expect_present = round % 2 == 1;

        assert_eq!(
            outcome,
            if expect_present {
                ToggleOutcome::Created
            } else {
                ToggleOutcome::Removed
            }
        );
        assert_eq!(
            app.state.interactions.is_liked(fan, post.id).await.unwrap(),
            expect_present
        );

        let current = PostRepository::get(&*app.store, post.id).await.unwrap().unwrap();
        assert_eq!(current.likes_count, if expect_present { 1 } else { 0 });
    }
}

#[tokio::test]
async fn likes_count_equals_present_state_users() {
    let app = test_app();
    let author = seed_user(&app, "author").await;
    let post = app
        .state
        .content
        .create_post(author, None, None, "counting", false)
        .await
        .unwrap();

    let mut present = 0;
    for i in 0..5 {
        let user = seed_user(&app, &format!("user{}", i)).await;
        app.state.interactions.toggle_like(user, post.id).await.unwrap();
        present += 1;

        // Every second user immediately unlikes again.
        if i % 2 == 1 {
            app.state.interactions.toggle_like(user, post.id).await.unwrap();
            present -= 1;
        }

        let current = PostRepository::get(&*app.store, post.id).await.unwrap().unwrap();
        assert_eq!(current.likes_count, present);
    }
}

#[tokio::test]
async fn follow_toggle_round_trip() {
    let app = test_app();
    let a = seed_user(&app, "a").await;
    let b = seed_user(&app, "b").await;

    assert_eq!(
        app.state.interactions.toggle_follow(a, b).await.unwrap(),
        ToggleOutcome::Created
    );
    assert_eq!(app.state.users.get(b).await.unwrap().unwrap().follower_count, 1);

    assert_eq!(
        app.state.interactions.toggle_follow(a, b).await.unwrap(),
        ToggleOutcome::Removed
    );
    assert_eq!(app.state.users.get(b).await.unwrap().unwrap().follower_count, 0);
}

#[tokio::test]
async fn follow_edges_are_directional() {
    let app = test_app();
    let a = seed_user(&app, "a").await;
    let b = seed_user(&app, "b").await;

    app.state.interactions.toggle_follow(a, b).await.unwrap();

    assert!(app.state.interactions.is_following(a, b).await.unwrap());
    assert!(!app.state.interactions.is_following(b, a).await.unwrap());

    // The reverse edge toggles independently.
    app.state.interactions.toggle_follow(b, a).await.unwrap();
    assert!(app.state.interactions.is_following(b, a).await.unwrap());

    app.state.interactions.toggle_follow(a, b).await.unwrap();
    assert!(!app.state.interactions.is_following(a, b).await.unwrap());
    assert!(app.state.interactions.is_following(b, a).await.unwrap());
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let app = test_app();
    let a = seed_user(&app, "a").await;

    let err = app.state.interactions.toggle_follow(a, a).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOperand(_)));
}

#[tokio::test]
async fn edge_store_rejects_self_follow() {
    let app = test_app();
    let a = seed_user(&app, "a").await;

    let err = app.store.create(EdgeKind::Follow, a, a).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOperand(_)));

    let err = app
        .store
        .toggle(EdgeKind::Follow, a, a, CounterTarget::UserFollowers(a))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidOperand(_)));
    assert_eq!(app.state.users.get(a).await.unwrap().unwrap().follower_count, 0);
}

#[tokio::test]
async fn liking_missing_post_is_not_found() {
    let app = test_app();
    let a = seed_user(&app, "a").await;

    let err = app
        .state
        .interactions
        .toggle_like(a, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_edge_create_is_conflict() {
    let app = test_app();
    let a = seed_user(&app, "a").await;
    let b = seed_user(&app, "b").await;

    app.store.create(EdgeKind::Follow, a, b).await.unwrap();
    let err = app.store.create(EdgeKind::Follow, a, b).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
}

#[tokio::test]
async fn deleting_missing_edge_is_not_found() {
    let app = test_app();
    let a = seed_user(&app, "a").await;
    let b = seed_user(&app, "b").await;

    let err = app.store.delete(EdgeKind::Like, a, b).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn raw_toggle_primitive_flips_state() {
    let app = test_app();
    let author = seed_user(&app, "author").await;
    let fan = seed_user(&app, "fan").await;
    let post = app
        .state
        .content
        .create_post(author, None, None, "raw", false)
        .await
        .unwrap();

    let counter = CounterTarget::PostLikes(post.id);
    assert_eq!(
        app.store.toggle(EdgeKind::Like, fan, post.id, counter).await.unwrap(),
        ToggleOutcome::Created
    );
    assert!(EdgeRepository::exists(&*app.store, EdgeKind::Like, fan, post.id).await.unwrap());
    assert_eq!(
        app.store.toggle(EdgeKind::Like, fan, post.id, counter).await.unwrap(),
        ToggleOutcome::Removed
    );
    assert!(!EdgeRepository::exists(&*app.store, EdgeKind::Like, fan, post.id).await.unwrap());
}
