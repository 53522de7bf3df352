mod common;

use common::{publish, setup, user, user_in};
use poem_blog_api::ServiceError;
use poem_blog_api::entities::{
    ActionStatus, CommentStatus, NotificationKind, NotificationStatus, Role, UserActionType,
    post_like, user_action,
};
use poem_blog_api::services::comments::{self, CommentInput};
use poem_blog_api::services::profiles::{self, ProfileInput};
use poem_blog_api::services::{Page, activity, follows, notifications, posts, recommended};
use futures_util::future::join_all;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

fn reply(content: &str, parent_id: Option<i32>) -> CommentInput {
    CommentInput {
        content: content.into(),
        parent_id,
    }
}

#[tokio::test]
async fn liking_twice_toggles_the_like() {
    let env = setup().await;
    let author = user(&env, "author", Role::Author).await;
    let reader = user(&env, "reader", Role::User).await;
    let post = publish(&env, &author, "Likeable").await;

    let first = posts::like_post(&env.db, &reader, post.id).await.unwrap();
    assert_eq!(first, posts::LikeState { liked: true, likes: 1 });
    let details = posts::post_details(&env.db, Some(&reader), post.id).await.unwrap();
    assert!(details.is_liked);
    assert_eq!(details.likers.len(), 1);

    let second = posts::like_post(&env.db, &reader, post.id).await.unwrap();
    assert_eq!(second, posts::LikeState { liked: false, likes: 0 });
    let details = posts::post_details(&env.db, Some(&reader), post.id).await.unwrap();
    assert!(!details.is_liked);
    assert_eq!(details.post.likes, 0);
    assert!(details.likers.is_empty());

    // one entry per side of the like cycle survives
    let reader_actions = user_action::Entity::find()
        .filter(user_action::Column::UserId.eq(reader.id))
        .filter(user_action::Column::PostId.eq(post.id))
        .all(&env.db)
        .await
        .unwrap();
    assert_eq!(reader_actions.len(), 1);
    assert_eq!(reader_actions[0].action_type, UserActionType::UnlikePost);

    let author_actions = user_action::Entity::find()
        .filter(user_action::Column::UserId.eq(author.id))
        .filter(user_action::Column::ActionType.eq(UserActionType::UnlikedPost))
        .all(&env.db)
        .await
        .unwrap();
    assert_eq!(author_actions.len(), 1);
}

#[tokio::test]
async fn simultaneous_likes_keep_the_counter_in_step() {
    let env = setup().await;
    let author = user(&env, "author", Role::Author).await;
    let post = publish(&env, &author, "Popular").await;
    let mut readers = Vec::new();
    for i in 0..8 {
        readers.push(user(&env, &format!("reader{i}"), Role::User).await);
    }

    let results = join_all(readers.iter().map(|r| posts::like_post(&env.db, r, post.id))).await;
    assert!(results.iter().all(Result::is_ok));

    let liked_rows = post_like::Entity::find()
        .filter(post_like::Column::PostId.eq(post.id))
        .filter(post_like::Column::IsLiked.eq(true))
        .count(&env.db)
        .await
        .unwrap();
    let stored = posts::post_details(&env.db, None, post.id).await.unwrap().post.likes;
    assert_eq!(liked_rows, 8);
    assert_eq!(stored as u64, liked_rows);

    let state = posts::unlike_post(&env.db, &readers[0], post.id).await.unwrap();
    assert_eq!(state, posts::LikeState { liked: false, likes: 7 });
}

#[tokio::test]
async fn unlike_requires_an_existing_like() {
    let env = setup().await;
    let author = user(&env, "author", Role::Author).await;
    let reader = user(&env, "reader", Role::User).await;
    let post = publish(&env, &author, "Unliked").await;

    let err = posts::unlike_post(&env.db, &reader, post.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    posts::like_post(&env.db, &reader, post.id).await.unwrap();
    let state = posts::unlike_post(&env.db, &reader, post.id).await.unwrap();
    assert_eq!(state, posts::LikeState { liked: false, likes: 0 });
}

#[tokio::test]
async fn author_liking_own_post_records_own_action() {
    let env = setup().await;
    let author = user(&env, "author", Role::Author).await;
    let post = publish(&env, &author, "Self love").await;

    posts::like_post(&env.db, &author, post.id).await.unwrap();
    let own = user_action::Entity::find()
        .filter(user_action::Column::UserId.eq(author.id))
        .filter(user_action::Column::ActionType.eq(UserActionType::LikeOwnPost))
        .all(&env.db)
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
}

#[tokio::test]
async fn pending_posts_cannot_be_liked_by_others() {
    let env = setup().await;
    let writer = user(&env, "writer", Role::User).await;
    let reader = user(&env, "reader", Role::User).await;
    let post = publish(&env, &writer, "Not yet").await;

    let err = posts::like_post(&env.db, &reader, post.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(posts::post_details(&env.db, None, post.id).await.is_err());
    assert!(posts::post_details(&env.db, Some(&writer), post.id).await.is_ok());
}

#[tokio::test]
async fn favourites_notify_the_author() {
    let env = setup().await;
    let author = user(&env, "author", Role::Author).await;
    let reader = user(&env, "reader", Role::User).await;
    let post = publish(&env, &author, "Keep this").await;
    let (_, mut author_rx) = env.hub.subscribe(author.id).await;

    assert!(matches!(
        posts::remove_from_favourite(&env.db, &reader, post.id).await,
        Err(ServiceError::InvalidInput(_))
    ));

    posts::add_to_favourite(&env.db, &env.hub, &reader, post.id).await.unwrap();
    posts::add_to_favourite(&env.db, &env.hub, &reader, post.id).await.unwrap();
    let favourites = posts::favourite_posts(&env.db, &reader).await.unwrap();
    assert_eq!(favourites.len(), 1);
    assert!(posts::post_details(&env.db, Some(&reader), post.id).await.unwrap().is_favourite);

    let inbox = notifications::list(&env.db, &author, Page::default()).await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(inbox.iter().all(|n| n.kind == NotificationKind::FavouritePost));
    assert!(author_rx.try_recv().is_ok());

    posts::remove_from_favourite(&env.db, &reader, post.id).await.unwrap();
    assert!(posts::favourite_posts(&env.db, &reader).await.unwrap().is_empty());
}

#[tokio::test]
async fn comments_wait_for_approval_unless_trusted() {
    let env = setup().await;
    let author = user(&env, "author", Role::Author).await;
    let reader = user(&env, "reader", Role::User).await;
    let other = user(&env, "other", Role::User).await;
    let editor = user(&env, "editor", Role::Editor).await;
    let post = publish(&env, &author, "Discuss").await;

    let pending = comments::create_comment(&env.db, &env.hub, &reader, post.id, reply("first!", None))
        .await
        .unwrap();
    assert_eq!(pending.status, CommentStatus::Pending);
    let own = comments::create_comment(&env.db, &env.hub, &author, post.id, reply("thanks", None))
        .await
        .unwrap();
    assert_eq!(own.status, CommentStatus::Approved);

    let seen_by_other = posts::post_details(&env.db, Some(&other), post.id).await.unwrap();
    assert_eq!(seen_by_other.comments.len(), 1);
    let seen_by_reader = posts::post_details(&env.db, Some(&reader), post.id).await.unwrap();
    assert_eq!(seen_by_reader.comments.len(), 2);
    let seen_by_editor = posts::post_details(&env.db, Some(&editor), post.id).await.unwrap();
    assert_eq!(seen_by_editor.comments.len(), 2);

    let queue = comments::pending_comments(&env.db, &editor).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert!(matches!(
        comments::pending_comments(&env.db, &reader).await,
        Err(ServiceError::Forbidden(_))
    ));

    let approved = comments::approve_comment(&env.db, &env.hub, &editor, pending.id)
        .await
        .unwrap();
    assert_eq!(approved.status, CommentStatus::Approved);
    assert!(matches!(
        comments::approve_comment(&env.db, &env.hub, &editor, pending.id).await,
        Err(ServiceError::InvalidInput(_))
    ));
    let reader_inbox = notifications::list(&env.db, &reader, Page::default()).await.unwrap();
    assert_eq!(reader_inbox[0].kind, NotificationKind::ApprovedComment);

    let author_inbox = notifications::list(&env.db, &author, Page::default()).await.unwrap();
    assert!(author_inbox.iter().any(|n| n.kind == NotificationKind::Comment));
}

#[tokio::test]
async fn replies_must_target_an_approved_comment_on_the_same_post() {
    let env = setup().await;
    let author = user(&env, "author", Role::Author).await;
    let reader = user(&env, "reader", Role::User).await;
    let first = publish(&env, &author, "First").await;
    let second = publish(&env, &author, "Second").await;

    let root = comments::create_comment(&env.db, &env.hub, &author, first.id, reply("root", None))
        .await
        .unwrap();
    let err = comments::create_comment(&env.db, &env.hub, &author, second.id, reply("x", Some(root.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let waiting = comments::create_comment(&env.db, &env.hub, &reader, first.id, reply("hmm", None))
        .await
        .unwrap();
    let err = comments::create_comment(&env.db, &env.hub, &author, first.id, reply("x", Some(waiting.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let child = comments::create_comment(&env.db, &env.hub, &author, first.id, reply("child", Some(root.id)))
        .await
        .unwrap();
    assert_eq!(child.parent_id, Some(root.id));

    let err = comments::create_comment(&env.db, &env.hub, &reader, first.id, reply("", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    assert!(matches!(
        comments::delete_comment(&env.db, &reader, root.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    comments::delete_comment(&env.db, &author, root.id).await.unwrap();
    let details = posts::post_details(&env.db, Some(&author), first.id).await.unwrap();
    assert!(details.comments.iter().all(|c| c.comment.id != child.id));
}

#[tokio::test]
async fn follow_and_unfollow() {
    let env = setup().await;
    let alice = user(&env, "alice", Role::User).await;
    let bob = user(&env, "bob", Role::User).await;
    let (_, mut bob_rx) = env.hub.subscribe(bob.id).await;

    assert!(matches!(
        follows::follow(&env.db, &env.hub, &alice, "alice").await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        follows::follow(&env.db, &env.hub, &alice, "nobody").await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        follows::unfollow(&env.db, &alice, "bob").await,
        Err(ServiceError::InvalidInput(_))
    ));

    follows::follow(&env.db, &env.hub, &alice, "bob").await.unwrap();
    assert!(matches!(
        follows::follow(&env.db, &env.hub, &alice, "bob").await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(follows::is_following(&env.db, alice.id, bob.id).await.unwrap());
    assert_eq!(follows::followers_count(&env.db, bob.id).await.unwrap(), 1);
    assert_eq!(follows::followings(&env.db, alice.id).await.unwrap()[0].username, "bob");

    bob_rx.try_recv().unwrap();
    match bob_rx.try_recv().unwrap() {
        poem_blog_api::hub::HubMessage::VisualizeNotification { notification } => {
            assert_eq!(notification.text, "alice started following you");
        }
        other => panic!("unexpected {other:?}"),
    }

    follows::unfollow(&env.db, &alice, "bob").await.unwrap();
    assert!(!follows::is_following(&env.db, alice.id, bob.id).await.unwrap());
    assert!(follows::followers(&env.db, bob.id).await.unwrap().is_empty());

    // the cycle keeps one entry per side
    let feed = activity::activities(&env.db, bob.id, Page::default()).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].action_type, UserActionType::Unfollowed);

    follows::follow(&env.db, &env.hub, &alice, "bob").await.unwrap();
    assert_eq!(follows::followers_count(&env.db, bob.id).await.unwrap(), 1);
}

#[tokio::test]
async fn read_follow_activity_is_cleaned_up() {
    let env = setup().await;
    let alice = user(&env, "alice", Role::Author).await;
    let bob = user(&env, "bob", Role::User).await;
    follows::follow(&env.db, &env.hub, &alice, "bob").await.unwrap();
    publish(&env, &alice, "Kept").await;

    assert_eq!(activity::mark_read(&env.db, alice.id).await.unwrap(), 2);
    assert_eq!(activity::delete_read_follow_actions(&env.db).await.unwrap(), 1);

    let alice_feed = activity::activities(&env.db, alice.id, Page::default()).await.unwrap();
    assert_eq!(alice_feed.len(), 1);
    assert_eq!(alice_feed[0].action_type, UserActionType::CreatePost);
    assert_eq!(alice_feed[0].status, ActionStatus::Read);
    // bob has not read his entry yet
    assert_eq!(activity::activity_count(&env.db, bob.id).await.unwrap(), 1);
}

#[tokio::test]
async fn notification_inbox_operations() {
    let env = setup().await;
    let alice = user(&env, "alice", Role::User).await;
    let bob = user(&env, "bob", Role::User).await;
    let carol = user(&env, "carol", Role::User).await;
    follows::follow(&env.db, &env.hub, &alice, "carol").await.unwrap();
    follows::follow(&env.db, &env.hub, &bob, "carol").await.unwrap();

    assert_eq!(notifications::unread_count(&env.db, carol.id).await.unwrap(), 2);
    let inbox = notifications::list(&env.db, &carol, Page::default()).await.unwrap();
    assert_eq!(inbox.len(), 2);

    let pinned = notifications::set_status(&env.db, &carol, inbox[0].id, NotificationStatus::Pinned)
        .await
        .unwrap();
    assert_eq!(pinned.status, NotificationStatus::Pinned);
    assert_eq!(notifications::unread_count(&env.db, carol.id).await.unwrap(), 1);

    assert!(matches!(
        notifications::set_status(&env.db, &alice, inbox[0].id, NotificationStatus::Read).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        notifications::delete(&env.db, &alice, inbox[1].id).await,
        Err(ServiceError::NotFound(_))
    ));

    assert_eq!(notifications::mark_all_read(&env.db, &carol).await.unwrap(), 1);
    assert_eq!(notifications::unread_count(&env.db, carol.id).await.unwrap(), 0);

    notifications::delete(&env.db, &carol, inbox[1].id).await.unwrap();
    assert_eq!(notifications::list(&env.db, &carol, Page::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn recommendations_follow_the_home_state() {
    let env = setup().await;
    let alice = user_in(&env, "alice", Role::User, "Sofia").await;
    user_in(&env, "bob", Role::User, "Sofia").await;
    user_in(&env, "carol", Role::User, "Sofia").await;
    user_in(&env, "dave", Role::User, "Varna").await;
    follows::follow(&env.db, &env.hub, &alice, "carol").await.unwrap();

    // alice: bob; bob: alice, carol; carol: alice, bob; dave: none
    assert_eq!(recommended::rebuild(&env.db).await.unwrap(), 5);

    let suggestions = recommended::recommended_users(&env.db, &alice, None).await.unwrap();
    let names: Vec<_> = suggestions.iter().map(|s| s.friend.username.as_str()).collect();
    assert_eq!(names, vec!["bob"]);
    assert!(!suggestions[0].has_followed);

    let bob = poem_blog_api::auth::CurrentUser {
        id: suggestions[0].friend.recommended_user_id,
        username: "bob".into(),
        role: Role::User,
    };
    let for_bob = recommended::recommended_users(&env.db, &bob, None).await.unwrap();
    let names: Vec<_> = for_bob.iter().map(|s| s.friend.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "carol"]);
    // alice follows carol: one following and one feed entry each side
    assert_eq!(for_bob[0].followings_count, 1);
    assert_eq!(for_bob[0].followers_count, 0);
    assert_eq!(for_bob[0].activities, 1);
    assert_eq!(for_bob[1].followers_count, 1);
    assert_eq!(for_bob[1].followings_count, 0);
    assert_eq!(for_bob[1].activities, 1);
    assert!(for_bob.iter().all(|s| !s.has_followed));

    let filtered = recommended::recommended_users(&env.db, &alice, Some("dave")).await.unwrap();
    assert!(filtered.is_empty());

    // a second run replaces the table instead of adding to it
    assert_eq!(recommended::rebuild(&env.db).await.unwrap(), 5);

    follows::follow(&env.db, &env.hub, &alice, "bob").await.unwrap();
    let stale = recommended::recommended_users(&env.db, &alice, None).await.unwrap();
    assert!(stale[0].has_followed);
    assert_eq!(stale[0].followers_count, 1);
}

#[tokio::test]
async fn profile_summary_and_update() {
    let env = setup().await;
    let writer = user(&env, "writer", Role::User).await;
    let author = user(&env, "author", Role::Author).await;
    let fan = user(&env, "fan", Role::User).await;
    publish(&env, &writer, "Hidden until approved").await;
    publish(&env, &author, "Visible").await;
    follows::follow(&env.db, &env.hub, &fan, "writer").await.unwrap();

    let public = profiles::profile(&env.db, "writer", None).await.unwrap();
    assert_eq!(public.posts, 0);
    assert_eq!(public.followers, 1);
    assert!(!public.has_followed);

    let as_fan = profiles::profile(&env.db, "writer", Some(&fan)).await.unwrap();
    assert!(as_fan.has_followed);

    let own = profiles::user_posts(&env.db, "writer", Some(&writer), Page::default()).await.unwrap();
    assert_eq!(own.len(), 1);
    let strangers = profiles::user_posts(&env.db, "writer", Some(&fan), Page::default()).await.unwrap();
    assert!(strangers.is_empty());

    let updated = profiles::update_profile(
        &env.db,
        &writer,
        ProfileInput {
            first_name: "Wren".into(),
            last_name: "Writer".into(),
            state: "Plovdiv".into(),
            image_url: Some("https://img.example.com/wren.png".into()),
            cover_image_url: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.state, "Plovdiv");

    let err = profiles::update_profile(
        &env.db,
        &writer,
        ProfileInput {
            first_name: "Wren".into(),
            last_name: "Writer".into(),
            state: "Plovdiv".into(),
            image_url: Some("not a url".into()),
            cover_image_url: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
