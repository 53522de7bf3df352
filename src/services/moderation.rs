//! Administration area: post approval and bans, account blocking.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

use super::blog::{fan_out_new_post, follower_ids};
use super::{find_post, find_user, notifications};
use crate::auth::CurrentUser;
use crate::entities::{
    NotificationKind, PostStatus, Role, blocked_post, notification, pending_post, post, user,
};
use crate::error::{ServiceError, ServiceResult};
use crate::hub::NotificationHub;

async fn posts_with_status(db: &DatabaseConnection, status: PostStatus) -> ServiceResult<Vec<post::Model>> {
    Ok(post::Entity::find()
        .filter(post::Column::Status.eq(status))
        .order_by_asc(post::Column::CreatedAt)
        .order_by_asc(post::Column::Id)
        .all(db)
        .await?)
}

pub async fn pending_posts(db: &DatabaseConnection, moderator: &CurrentUser) -> ServiceResult<Vec<post::Model>> {
    moderator.require_privileged()?;
    posts_with_status(db, PostStatus::Pending).await
}

pub async fn banned_posts(db: &DatabaseConnection, moderator: &CurrentUser) -> ServiceResult<Vec<post::Model>> {
    moderator.require_privileged()?;
    posts_with_status(db, PostStatus::Banned).await
}

async fn set_status(txn: &DatabaseTransaction, found: post::Model, status: PostStatus) -> ServiceResult<post::Model> {
    let mut am: post::ActiveModel = found.into();
    am.status = Set(status);
    Ok(am.update(txn).await?)
}

async fn set_pending_flag(txn: &DatabaseTransaction, post_id: i32, pending: bool) -> ServiceResult<()> {
    pending_post::Entity::update_many()
        .col_expr(pending_post::Column::IsPending, Expr::value(pending))
        .filter(pending_post::Column::PostId.eq(post_id))
        .exec(txn)
        .await?;
    Ok(())
}

async fn set_blocked_flag(txn: &DatabaseTransaction, found: &post::Model, blocked: bool) -> ServiceResult<()> {
    let res = blocked_post::Entity::update_many()
        .col_expr(blocked_post::Column::IsBlocked, Expr::value(blocked))
        .filter(blocked_post::Column::PostId.eq(found.id))
        .exec(txn)
        .await?;
    if res.rows_affected == 0 {
        blocked_post::ActiveModel {
            post_id: Set(found.id),
            author_id: Set(found.author_id),
            is_blocked: Set(blocked),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn notify_author(
    txn: &DatabaseTransaction,
    moderator: &CurrentUser,
    post: &post::Model,
    kind: NotificationKind,
) -> ServiceResult<Option<notification::Model>> {
    if post.author_id == moderator.id {
        return Ok(None);
    }
    let created = notifications::add_notification(
        txn,
        post.author_id,
        moderator.id,
        kind,
        &post.short_content,
        Some(post.id),
    )
    .await?;
    Ok(Some(created))
}

/// Pending → Approved. The author hears back and their followers get the post.
pub async fn approve_post(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    moderator: &CurrentUser,
    id: i32,
) -> ServiceResult<post::Model> {
    moderator.require_privileged()?;
    let txn = db.begin().await?;
    let found = find_post(&txn, id).await?;
    if found.status != PostStatus::Pending {
        tracing::warn!(post_id = id, status = ?found.status, "approve rejected: post is not pending");
        return Err(ServiceError::invalid("post is not pending"));
    }

    let approved = set_status(&txn, found, PostStatus::Approved).await?;
    set_pending_flag(&txn, approved.id, false).await?;

    let mut created: Vec<notification::Model> = notify_author(&txn, moderator, &approved, NotificationKind::ApprovedPost)
        .await?
        .into_iter()
        .collect();
    let followers = follower_ids(&txn, approved.author_id).await?;
    created.extend(fan_out_new_post(&txn, &approved, followers).await?);

    txn.commit().await?;
    tracing::info!(post_id = approved.id, moderator = moderator.id, "post approved");
    notifications::push_all(db, hub, &created).await?;
    Ok(approved)
}

pub async fn ban_post(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    moderator: &CurrentUser,
    id: i32,
) -> ServiceResult<post::Model> {
    moderator.require_privileged()?;
    let txn = db.begin().await?;
    let found = find_post(&txn, id).await?;
    if found.status == PostStatus::Banned {
        tracing::warn!(post_id = id, "ban rejected: post already banned");
        return Err(ServiceError::invalid("post is already banned"));
    }

    let banned = set_status(&txn, found, PostStatus::Banned).await?;
    set_blocked_flag(&txn, &banned, true).await?;
    set_pending_flag(&txn, banned.id, false).await?;
    let created: Vec<_> = notify_author(&txn, moderator, &banned, NotificationKind::BannedPost)
        .await?
        .into_iter()
        .collect();

    txn.commit().await?;
    tracing::info!(post_id = banned.id, moderator = moderator.id, "post banned");
    notifications::push_all(db, hub, &created).await?;
    Ok(banned)
}

pub async fn unban_post(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    moderator: &CurrentUser,
    id: i32,
) -> ServiceResult<post::Model> {
    moderator.require_privileged()?;
    let txn = db.begin().await?;
    let found = find_post(&txn, id).await?;
    if found.status != PostStatus::Banned {
        tracing::warn!(post_id = id, status = ?found.status, "unban rejected: post is not banned");
        return Err(ServiceError::invalid("post is not banned"));
    }

    let restored = set_status(&txn, found, PostStatus::Approved).await?;
    set_blocked_flag(&txn, &restored, false).await?;
    let created: Vec<_> = notify_author(&txn, moderator, &restored, NotificationKind::UnbannedPost)
        .await?
        .into_iter()
        .collect();

    txn.commit().await?;
    tracing::info!(post_id = restored.id, moderator = moderator.id, "post unbanned");
    notifications::push_all(db, hub, &created).await?;
    Ok(restored)
}

async fn set_blocked(db: &DatabaseConnection, admin: &CurrentUser, user_id: i32, blocked: bool) -> ServiceResult<user::Model> {
    admin.require_admin()?;
    if admin.id == user_id {
        return Err(ServiceError::invalid("you cannot block yourself"));
    }
    let mut am: user::ActiveModel = find_user(db, user_id).await?.into();
    am.is_blocked = Set(blocked);
    let updated = am.update(db).await?;
    tracing::info!(user_id, blocked, admin = admin.id, "account block state changed");
    Ok(updated)
}

pub async fn block_user(db: &DatabaseConnection, admin: &CurrentUser, user_id: i32) -> ServiceResult<user::Model> {
    set_blocked(db, admin, user_id, true).await
}

pub async fn unblock_user(db: &DatabaseConnection, admin: &CurrentUser, user_id: i32) -> ServiceResult<user::Model> {
    set_blocked(db, admin, user_id, false).await
}

pub async fn set_role(
    db: &DatabaseConnection,
    admin: &CurrentUser,
    user_id: i32,
    role: Role,
) -> ServiceResult<user::Model> {
    admin.require_admin()?;
    if admin.id == user_id && role != Role::Administrator {
        return Err(ServiceError::invalid("you cannot demote yourself"));
    }
    let mut am: user::ActiveModel = find_user(db, user_id).await?.into();
    am.role = Set(role);
    let updated = am.update(db).await?;
    tracing::info!(user_id, role = ?role, admin = admin.id, "role changed");
    Ok(updated)
}
