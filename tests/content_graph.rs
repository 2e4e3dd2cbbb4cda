//! Post graph semantics: repost flattening, ownership checks, repost body
//! immutability, cascading deletion.

mod common;

use common::{seed_user, test_app};
use pulse_service::error::AppError;
use pulse_service::repository::{PostRepository, RepostToggle};
use uuid::Uuid;

#[tokio::test]
async fn reposting_a_repost_attaches_to_the_original() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;
    let u3 = seed_user(&app, "u3").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "hello", false)
        .await
        .unwrap();

    let r1 = match app.state.content.toggle_repost(u2, p1.id, None).await.unwrap() {
        RepostToggle::Created(post) => post,
        RepostToggle::Removed => panic!("expected repost creation"),
    };
    assert_eq!(r1.parent_id, Some(p1.id));
    assert!(r1.is_repost);
    assert!(r1.body.is_empty());

    // Reposting the repost flattens to the original.
    let r2 = match app.state.content.toggle_repost(u3, r1.id, None).await.unwrap() {
        RepostToggle::Created(post) => post,
        RepostToggle::Removed => panic!("expected repost creation"),
    };
    assert_eq!(r2.parent_id, Some(p1.id));

    let target = app.state.content.resolve_repost_target(r2.id).await.unwrap();
    assert_eq!(target.id, p1.id);

    let p1 = app.store.get(p1.id).await.unwrap().unwrap();
    assert_eq!(p1.reposts_count, 2);
}

#[tokio::test]
async fn scenario_repost_chain_and_like_round_trip() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;
    let u3 = seed_user(&app, "u3").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "hello", false)
        .await
        .unwrap();

    let r1 = match app.state.content.toggle_repost(u2, p1.id, None).await.unwrap() {
        RepostToggle::Created(post) => post,
        RepostToggle::Removed => panic!("expected repost creation"),
    };
    assert_eq!(r1.parent_id, Some(p1.id));

    let r2 = match app.state.content.toggle_repost(u3, r1.id, None).await.unwrap() {
        RepostToggle::Created(post) => post,
        RepostToggle::Removed => panic!("expected repost creation"),
    };
    assert_eq!(r2.parent_id, Some(p1.id));

    app.state.interactions.toggle_like(u1, p1.id).await.unwrap();
    assert_eq!(app.store.get(p1.id).await.unwrap().unwrap().likes_count, 1);

    app.state.interactions.toggle_like(u1, p1.id).await.unwrap();
    assert_eq!(app.store.get(p1.id).await.unwrap().unwrap().likes_count, 0);
}

#[tokio::test]
async fn repost_toggle_removes_on_second_call() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "toggle me", false)
        .await
        .unwrap();

    assert!(matches!(
        app.state.content.toggle_repost(u2, p1.id, None).await.unwrap(),
        RepostToggle::Created(_)
    ));
    assert!(matches!(
        app.state.content.toggle_repost(u2, p1.id, None).await.unwrap(),
        RepostToggle::Removed
    ));

    let p1 = app.store.get(p1.id).await.unwrap().unwrap();
    assert_eq!(p1.reposts_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_repost_toggles_keep_toggle_semantics() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "contested", false)
        .await
        .unwrap();

    // Two tasks hammer the same (user, target) pair. Every call must come
    // back as a flip, never as a duplicate error, and an even total of flips
    // lands back on ABSENT with the counter at zero.
    let rounds = 500;
    let mut handles = Vec::new();
    for _ in 0..2 {
        let content = app.state.content.clone();
        let target_id = p1.id;
        handles.push(tokio::spawn(async move {
            for _ in 0..rounds {
                content.toggle_repost(u2, target_id, None).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let p1 = app.store.get(p1.id).await.unwrap().unwrap();
    assert_eq!(p1.reposts_count, 0);

    // The pair is back in ABSENT state, so the next flip creates.
    assert!(matches!(
        app.state.content.toggle_repost(u2, p1.id, None).await.unwrap(),
        RepostToggle::Created(_)
    ));
}

#[tokio::test]
async fn duplicate_repost_via_create_is_conflict() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "original", false)
        .await
        .unwrap();

    app.state
        .content
        .create_post(u2, Some(p1.id), None, "", true)
        .await
        .unwrap();
    let err = app
        .state
        .content
        .create_post(u2, Some(p1.id), None, "", true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
}

#[tokio::test]
async fn repost_body_is_immutable_but_quote_is_not() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "original", false)
        .await
        .unwrap();
    let r1 = match app
        .state
        .content
        .toggle_repost(u2, p1.id, Some("take a look".to_string()))
        .await
        .unwrap()
    {
        RepostToggle::Created(post) => post,
        RepostToggle::Removed => panic!("expected repost creation"),
    };

    let err = app
        .state
        .content
        .edit_post(u2, r1.id, Some("new body"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RepostBodyImmutable));

    let edited = app
        .state
        .content
        .edit_post(u2, r1.id, None, Some("changed my mind"))
        .await
        .unwrap();
    assert_eq!(edited.quote.as_deref(), Some("changed my mind"));
    assert!(edited.body.is_empty());
}

#[tokio::test]
async fn only_the_author_may_edit_or_delete() {
    let app = test_app();
    let author = seed_user(&app, "author").await;
    let stranger = seed_user(&app, "stranger").await;

    let post = app
        .state
        .content
        .create_post(author, None, None, "mine", false)
        .await
        .unwrap();

    let err = app
        .state
        .content
        .edit_post(stranger, post.id, Some("stolen"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotOwner));

    let err = app
        .state
        .content
        .delete_post(stranger, post.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotOwner));

    // The author still can.
    app.state
        .content
        .edit_post(author, post.id, Some("still mine"), None)
        .await
        .unwrap();
    app.state.content.delete_post(author, post.id).await.unwrap();
}

#[tokio::test]
async fn omitted_edit_fields_stay_unchanged() {
    let app = test_app();
    let author = seed_user(&app, "author").await;
    let post = app
        .state
        .content
        .create_post(author, None, None, "original body", false)
        .await
        .unwrap();

    let edited = app
        .state
        .content
        .edit_post(author, post.id, None, Some("a quote"))
        .await
        .unwrap();
    assert_eq!(edited.body, "original body");
    assert_eq!(edited.quote.as_deref(), Some("a quote"));

    // Omitting the quote leaves it in place; there is no clear operation.
    let edited = app
        .state
        .content
        .edit_post(author, post.id, Some("new body"), None)
        .await
        .unwrap();
    assert_eq!(edited.body, "new body");
    assert_eq!(edited.quote.as_deref(), Some("a quote"));
}

#[tokio::test]
async fn editing_to_an_empty_body_is_rejected() {
    let app = test_app();
    let author = seed_user(&app, "author").await;
    let post = app
        .state
        .content
        .create_post(author, None, None, "not empty", false)
        .await
        .unwrap();

    let err = app
        .state
        .content
        .edit_post(author, post.id, Some("   "), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn deleting_an_original_cascades_to_reposts_but_spares_comments() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;
    let u3 = seed_user(&app, "u3").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "to be deleted", false)
        .await
        .unwrap();
    let r1 = match app.state.content.toggle_repost(u2, p1.id, None).await.unwrap() {
        RepostToggle::Created(post) => post,
        RepostToggle::Removed => panic!("expected repost creation"),
    };
    let comment = app
        .state
        .content
        .create_post(u3, Some(p1.id), None, "nice post", false)
        .await
        .unwrap();

    app.state.interactions.toggle_like(u3, p1.id).await.unwrap();
    app.state.interactions.toggle_like(u3, r1.id).await.unwrap();

    app.state.content.delete_post(u1, p1.id).await.unwrap();

    assert!(app.store.get(p1.id).await.unwrap().is_none());
    assert!(app.store.get(r1.id).await.unwrap().is_none());

    // The comment survives with an unavailable parent.
    let orphan = app.state.content.get_post(comment.id).await.unwrap();
    assert!(orphan.parent.is_none());
    assert_eq!(orphan.post.parent_id, Some(p1.id));
}

#[tokio::test]
async fn deleting_a_repost_releases_the_target_counter() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "original", false)
        .await
        .unwrap();
    let r1 = match app.state.content.toggle_repost(u2, p1.id, None).await.unwrap() {
        RepostToggle::Created(post) => post,
        RepostToggle::Removed => panic!("expected repost creation"),
    };
    assert_eq!(app.store.get(p1.id).await.unwrap().unwrap().reposts_count, 1);

    app.state.content.delete_post(u2, r1.id).await.unwrap();
    assert_eq!(app.store.get(p1.id).await.unwrap().unwrap().reposts_count, 0);
}

#[tokio::test]
async fn commenting_requires_an_existing_parent() {
    let app = test_app();
    let author = seed_user(&app, "author").await;

    let err = app
        .state
        .content
        .create_post(author, Some(Uuid::new_v4()), None, "into the void", false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn unknown_author_cannot_post() {
    let app = test_app();

    let err = app
        .state
        .content
        .create_post(Uuid::new_v4(), None, None, "ghost", false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn feed_lists_newest_first_with_parents() {
    let app = test_app();
    let u1 = seed_user(&app, "u1").await;
    let u2 = seed_user(&app, "u2").await;

    let p1 = app
        .state
        .content
        .create_post(u1, None, None, "first", false)
        .await
        .unwrap();
    let c1 = app
        .state
        .content
        .create_post(u2, Some(p1.id), None, "a comment", false)
        .await
        .unwrap();

    let feed = app.state.content.list_recent(10, 0).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].post.id, c1.id);
    assert_eq!(feed[0].parent.as_ref().map(|p| p.id), Some(p1.id));
    assert_eq!(feed[1].post.id, p1.id);
    assert!(feed[1].parent.is_none());
}
