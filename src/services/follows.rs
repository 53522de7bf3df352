//! Follow and unfollow between users.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::activity::{self, NewAction};
use super::blog::follower_ids;
use super::{find_user_by_name, notifications};
use crate::auth::CurrentUser;
use crate::entities::{NotificationKind, UserActionType, follow, user};
use crate::error::{ServiceError, ServiceResult};
use crate::hub::NotificationHub;

async fn relation<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    followee_id: i32,
) -> ServiceResult<Option<follow::Model>> {
    Ok(follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(follower_id))
        .filter(follow::Column::FolloweeId.eq(followee_id))
        .one(db)
        .await?)
}

pub async fn is_following<C: ConnectionTrait>(db: &C, follower_id: i32, followee_id: i32) -> ServiceResult<bool> {
    Ok(relation(db, follower_id, followee_id)
        .await?
        .is_some_and(|f| f.is_followed))
}

pub async fn follow(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    user: &CurrentUser,
    username: &str,
) -> ServiceResult<()> {
    let txn = db.begin().await?;
    let target = find_user_by_name(&txn, username).await?;
    if target.id == user.id {
        return Err(ServiceError::invalid("you cannot follow yourself"));
    }

    match relation(&txn, user.id, target.id).await? {
        Some(row) if row.is_followed => {
            return Err(ServiceError::invalid(format!("already following {}", target.username)));
        }
        Some(row) => {
            let mut am: follow::ActiveModel = row.into();
            am.is_followed = Set(true);
            am.update(&txn).await?;
        }
        None => {
            follow::ActiveModel {
                follower_id: Set(user.id),
                followee_id: Set(target.id),
                is_followed: Set(true),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    activity::add_cyclic_action(&txn, NewAction::new(user.id, UserActionType::Follow, target.id)).await?;
    activity::add_cyclic_action(&txn, NewAction::new(target.id, UserActionType::Followed, user.id)).await?;
    let created = notifications::add_notification(
        &txn,
        target.id,
        user.id,
        NotificationKind::Follow,
        &format!("{} started following you", user.username),
        None,
    )
    .await?;

    txn.commit().await?;
    tracing::info!(follower = user.id, followee = target.id, "follow");
    notifications::push_all(db, hub, &[created]).await?;
    Ok(())
}

pub async fn unfollow(db: &DatabaseConnection, user: &CurrentUser, username: &str) -> ServiceResult<()> {
    let txn = db.begin().await?;
    let target = find_user_by_name(&txn, username).await?;

    let row = relation(&txn, user.id, target.id)
        .await?
        .filter(|f| f.is_followed)
        .ok_or_else(|| ServiceError::invalid(format!("not following {}", target.username)))?;
    let mut am: follow::ActiveModel = row.into();
    am.is_followed = Set(false);
    am.update(&txn).await?;

    activity::add_cyclic_action(&txn, NewAction::new(user.id, UserActionType::Unfollow, target.id)).await?;
    activity::add_cyclic_action(&txn, NewAction::new(target.id, UserActionType::Unfollowed, user.id))
        .await?;

    txn.commit().await?;
    tracing::info!(follower = user.id, followee = target.id, "unfollow");
    Ok(())
}

pub async fn followers(db: &DatabaseConnection, user_id: i32) -> ServiceResult<Vec<user::Model>> {
    let ids = follower_ids(db, user_id).await?;
    users_by_ids(db, ids).await
}

pub async fn followings(db: &DatabaseConnection, user_id: i32) -> ServiceResult<Vec<user::Model>> {
    let ids: Vec<i32> = follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user_id))
        .filter(follow::Column::IsFollowed.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.followee_id)
        .collect();
    users_by_ids(db, ids).await
}

async fn users_by_ids(db: &DatabaseConnection, ids: Vec<i32>) -> ServiceResult<Vec<user::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .order_by_asc(user::Column::Username)
        .all(db)
        .await?)
}

pub async fn followers_count<C: ConnectionTrait>(db: &C, user_id: i32) -> ServiceResult<u64> {
    Ok(follow::Entity::find()
        .filter(follow::Column::FolloweeId.eq(user_id))
        .filter(follow::Column::IsFollowed.eq(true))
        .count(db)
        .await?)
}

pub async fn followings_count<C: ConnectionTrait>(db: &C, user_id: i32) -> ServiceResult<u64> {
    Ok(follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user_id))
        .filter(follow::Column::IsFollowed.eq(true))
        .count(db)
        .await?)
}
