use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use validator::Validate;

use super::activity::{self, NewAction};
use super::posts::CommentEntry;
use super::{find_visible_post, notifications};
use crate::auth::CurrentUser;
use crate::entities::{CommentStatus, NotificationKind, UserActionType, comment, user};
use crate::error::{ServiceError, ServiceResult};
use crate::hub::NotificationHub;
use crate::text;

#[derive(Debug, Clone, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    pub parent_id: Option<i32>,
}

async fn find_comment<C: sea_orm::ConnectionTrait>(db: &C, id: i32) -> ServiceResult<comment::Model> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("comment"))
}

/// Moderators and the post author publish immediately; other comments wait for approval.
pub async fn create_comment(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    user: &CurrentUser,
    post_id: i32,
    input: CommentInput,
) -> ServiceResult<comment::Model> {
    input.validate()?;
    let txn = db.begin().await?;
    let post = find_visible_post(&txn, post_id, Some(user)).await?;

    if let Some(parent_id) = input.parent_id {
        let parent = find_comment(&txn, parent_id).await?;
        if parent.post_id != post.id {
            return Err(ServiceError::invalid("parent comment belongs to another post"));
        }
        if parent.status != CommentStatus::Approved {
            return Err(ServiceError::invalid("parent comment is not approved"));
        }
    }

    let status = if user.is_privileged() || user.id == post.author_id {
        CommentStatus::Approved
    } else {
        CommentStatus::Pending
    };
    let now = Utc::now();
    let created = comment::ActiveModel {
        post_id: Set(post.id),
        author_id: Set(user.id),
        parent_id: Set(input.parent_id),
        content: Set(input.content),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    activity::add_action(
        &txn,
        NewAction::on_post(user.id, UserActionType::CreateComment, post.author_id, &post),
    )
    .await?;

    let mut pushed = Vec::new();
    if post.author_id != user.id {
        pushed.push(
            notifications::add_notification(
                &txn,
                post.author_id,
                user.id,
                NotificationKind::Comment,
                &text::short_content(&created.content),
                Some(post.id),
            )
            .await?,
        );
    }

    txn.commit().await?;
    tracing::info!(comment_id = created.id, post_id = post.id, status = ?status, "comment created");
    notifications::push_all(db, hub, &pushed).await?;
    Ok(created)
}

/// Replies go with the comment.
pub async fn delete_comment(db: &DatabaseConnection, user: &CurrentUser, id: i32) -> ServiceResult<()> {
    let found = find_comment(db, id).await?;
    if !user.can_manage(found.author_id) {
        return Err(ServiceError::forbidden("only the author or a moderator may delete this comment"));
    }
    comment::Entity::delete_by_id(found.id).exec(db).await?;
    tracing::info!(comment_id = id, by = user.id, "comment deleted");
    Ok(())
}

pub async fn pending_comments(db: &DatabaseConnection, moderator: &CurrentUser) -> ServiceResult<Vec<CommentEntry>> {
    moderator.require_privileged()?;
    let rows = comment::Entity::find()
        .filter(comment::Column::Status.eq(CommentStatus::Pending))
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(comment, author)| CommentEntry { comment, author })
        .collect())
}

pub async fn approve_comment(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    moderator: &CurrentUser,
    id: i32,
) -> ServiceResult<comment::Model> {
    moderator.require_privileged()?;
    let txn = db.begin().await?;
    let found = find_comment(&txn, id).await?;
    if found.status != CommentStatus::Pending {
        tracing::warn!(comment_id = id, "approve requested for a comment that is not pending");
        return Err(ServiceError::invalid("comment is not pending"));
    }
    let mut am: comment::ActiveModel = found.into();
    am.status = Set(CommentStatus::Approved);
    am.updated_at = Set(Utc::now());
    let approved = am.update(&txn).await?;

    let mut pushed = Vec::new();
    if approved.author_id != moderator.id {
        pushed.push(
            notifications::add_notification(
                &txn,
                approved.author_id,
                moderator.id,
                NotificationKind::ApprovedComment,
                &text::short_content(&approved.content),
                Some(approved.post_id),
            )
            .await?,
        );
    }
    txn.commit().await?;
    notifications::push_all(db, hub, &pushed).await?;
    Ok(approved)
}
