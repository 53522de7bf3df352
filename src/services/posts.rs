//! Reading a post, likes and favourites.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

use super::activity::{self, NewAction};
use super::{find_post, find_user, find_visible_post, notifications};
use crate::auth::CurrentUser;
use crate::entities::{
    CommentStatus, NotificationKind, UserActionType, category, comment, favourite_post, post,
    post_like, tag, user,
};
use crate::error::{ServiceError, ServiceResult};
use crate::hub::NotificationHub;

#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub comment: comment::Model,
    pub author: Option<user::Model>,
}

#[derive(Debug, Clone)]
pub struct PostDetails {
    pub post: post::Model,
    pub author: user::Model,
    pub category: Option<category::Model>,
    pub tags: Vec<tag::Model>,
    pub comments: Vec<CommentEntry>,
    pub likers: Vec<user::Model>,
    pub is_liked: bool,
    pub is_author: bool,
    pub is_favourite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: i32,
}

pub async fn post_details(
    db: &DatabaseConnection,
    viewer: Option<&CurrentUser>,
    id: i32,
) -> ServiceResult<PostDetails> {
    let post = find_visible_post(db, id, viewer).await?;
    let author = find_user(db, post.author_id).await?;
    let category = post.find_related(category::Entity).one(db).await?;
    let tags = post
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?;

    // moderators see every comment; others see approved ones and their own pending ones
    let mut comment_query = comment::Entity::find().filter(comment::Column::PostId.eq(post.id));
    match viewer {
        Some(v) if v.is_privileged() => {}
        Some(v) => {
            comment_query = comment_query.filter(
                Condition::any()
                    .add(comment::Column::Status.eq(CommentStatus::Approved))
                    .add(comment::Column::AuthorId.eq(v.id)),
            )
        }
        None => comment_query = comment_query.filter(comment::Column::Status.eq(CommentStatus::Approved)),
    }
    let comments = comment_query
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .find_also_related(user::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|(comment, author)| CommentEntry { comment, author })
        .collect();

    let likes = post_like::Entity::find()
        .filter(post_like::Column::PostId.eq(post.id))
        .filter(post_like::Column::IsLiked.eq(true))
        .order_by_asc(post_like::Column::Id)
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    let is_liked = viewer.is_some_and(|v| likes.iter().any(|(like, _)| like.user_id == v.id));
    let likers = likes.into_iter().filter_map(|(_, liker)| liker).collect();

    let is_favourite = match viewer {
        Some(v) => favourite_post::Entity::find()
            .filter(favourite_post::Column::PostId.eq(post.id))
            .filter(favourite_post::Column::UserId.eq(v.id))
            .filter(favourite_post::Column::IsFavourite.eq(true))
            .one(db)
            .await?
            .is_some(),
        None => false,
    };
    let is_author = viewer.is_some_and(|v| v.id == post.author_id);

    Ok(PostDetails {
        post,
        author,
        category,
        tags,
        comments,
        likers,
        is_liked,
        is_author,
        is_favourite,
    })
}

/// Feed entries for a like or unlike of `post` by `user`.
async fn record_like_activity<C: ConnectionTrait>(
    db: &C,
    user: &CurrentUser,
    post: &post::Model,
    liked: bool,
) -> ServiceResult<()> {
    if post.author_id == user.id {
        let own = if liked {
            UserActionType::LikeOwnPost
        } else {
            UserActionType::UnlikeOwnPost
        };
        activity::add_cyclic_action(db, NewAction::on_post(user.id, own, user.id, post)).await?;
    } else {
        let (for_author, for_user) = if liked {
            (UserActionType::LikedPost, UserActionType::LikePost)
        } else {
            (UserActionType::UnlikedPost, UserActionType::UnlikePost)
        };
        activity::add_cyclic_action(db, NewAction::on_post(post.author_id, for_author, user.id, post))
            .await?;
        activity::add_cyclic_action(db, NewAction::on_post(user.id, for_user, post.author_id, post))
            .await?;
    }
    Ok(())
}

/// Move the counter by one in SQL, never below zero, and return the stored row.
async fn bump_likes<C: ConnectionTrait>(db: &C, post_id: i32, up: bool) -> ServiceResult<post::Model> {
    let update = post::Entity::update_many().filter(post::Column::Id.eq(post_id));
    let update = if up {
        update.col_expr(post::Column::Likes, Expr::col(post::Column::Likes).add(1))
    } else {
        update
            .col_expr(post::Column::Likes, Expr::col(post::Column::Likes).sub(1))
            .filter(post::Column::Likes.gt(0))
    };
    update.exec(db).await?;
    find_post(db, post_id).await
}

/// Flip the viewer's like. The counter on the post follows the flag.
pub async fn like_post(db: &DatabaseConnection, user: &CurrentUser, id: i32) -> ServiceResult<LikeState> {
    let txn = db.begin().await?;
    let post = find_visible_post(&txn, id, Some(user)).await?;

    let existing = post_like::Entity::find()
        .filter(post_like::Column::PostId.eq(post.id))
        .filter(post_like::Column::UserId.eq(user.id))
        .one(&txn)
        .await?;
    let liked = match existing {
        Some(row) => {
            let now_liked = !row.is_liked;
            let mut am: post_like::ActiveModel = row.into();
            am.is_liked = Set(now_liked);
            am.update(&txn).await?;
            now_liked
        }
        None => {
            post_like::ActiveModel {
                post_id: Set(post.id),
                user_id: Set(user.id),
                is_liked: Set(true),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            true
        }
    };

    let post = bump_likes(&txn, post.id, liked).await?;

    record_like_activity(&txn, user, &post, liked).await?;
    txn.commit().await?;
    tracing::info!(post_id = post.id, user = user.id, liked, "like toggled");
    Ok(LikeState {
        liked,
        likes: post.likes,
    })
}

pub async fn unlike_post(db: &DatabaseConnection, user: &CurrentUser, id: i32) -> ServiceResult<LikeState> {
    let txn = db.begin().await?;
    let post = find_visible_post(&txn, id, Some(user)).await?;

    let row = post_like::Entity::find()
        .filter(post_like::Column::PostId.eq(post.id))
        .filter(post_like::Column::UserId.eq(user.id))
        .filter(post_like::Column::IsLiked.eq(true))
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::invalid("post is not liked"))?;
    let mut like: post_like::ActiveModel = row.into();
    like.is_liked = Set(false);
    like.update(&txn).await?;

    let post = bump_likes(&txn, post.id, false).await?;

    record_like_activity(&txn, user, &post, false).await?;
    txn.commit().await?;
    tracing::info!(post_id = post.id, user = user.id, "post unliked");
    Ok(LikeState {
        liked: false,
        likes: post.likes,
    })
}

pub async fn add_to_favourite(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    user: &CurrentUser,
    id: i32,
) -> ServiceResult<()> {
    let txn = db.begin().await?;
    let post = find_visible_post(&txn, id, Some(user)).await?;

    let existing = favourite_post::Entity::find()
        .filter(favourite_post::Column::PostId.eq(post.id))
        .filter(favourite_post::Column::UserId.eq(user.id))
        .one(&txn)
        .await?;
    match existing {
        Some(row) => {
            let mut am: favourite_post::ActiveModel = row.into();
            am.is_favourite = Set(true);
            am.update(&txn).await?;
        }
        None => {
            favourite_post::ActiveModel {
                post_id: Set(post.id),
                user_id: Set(user.id),
                is_favourite: Set(true),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    let mut created = Vec::new();
    if post.author_id != user.id {
        created.push(
            notifications::add_notification(
                &txn,
                post.author_id,
                user.id,
                NotificationKind::FavouritePost,
                &post.short_content,
                Some(post.id),
            )
            .await?,
        );
    }
    txn.commit().await?;
    notifications::push_all(db, hub, &created).await?;
    Ok(())
}

pub async fn remove_from_favourite(db: &DatabaseConnection, user: &CurrentUser, id: i32) -> ServiceResult<()> {
    let post = find_post(db, id).await?;
    let row = favourite_post::Entity::find()
        .filter(favourite_post::Column::PostId.eq(post.id))
        .filter(favourite_post::Column::UserId.eq(user.id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::invalid("post is not in favourites"))?;
    let mut am: favourite_post::ActiveModel = row.into();
    am.is_favourite = Set(false);
    am.update(db).await?;
    Ok(())
}

pub async fn favourite_posts(db: &DatabaseConnection, user: &CurrentUser) -> ServiceResult<Vec<post::Model>> {
    let rows = favourite_post::Entity::find()
        .filter(favourite_post::Column::UserId.eq(user.id))
        .filter(favourite_post::Column::IsFavourite.eq(true))
        .order_by_desc(favourite_post::Column::Id)
        .find_also_related(post::Entity)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(_, post)| post)
        .filter(|p| super::can_view(p, Some(user)))
        .collect())
}
