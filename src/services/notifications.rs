//! Notification inbox and hub delivery.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::Page;
use crate::auth::CurrentUser;
use crate::entities::{NotificationKind, NotificationStatus, notification};
use crate::error::{ServiceError, ServiceResult};
use crate::hub::NotificationHub;

pub async fn add_notification<C: ConnectionTrait>(
    db: &C,
    recipient_id: i32,
    sender_id: i32,
    kind: NotificationKind,
    text: &str,
    post_id: Option<i32>,
) -> ServiceResult<notification::Model> {
    let created = notification::ActiveModel {
        recipient_id: Set(recipient_id),
        sender_id: Set(sender_id),
        kind: Set(kind),
        text: Set(text.to_string()),
        post_id: Set(post_id),
        status: Set(NotificationStatus::Unread),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created)
}

pub async fn unread_count<C: ConnectionTrait>(db: &C, user_id: i32) -> ServiceResult<u64> {
    let count = notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(user_id))
        .filter(notification::Column::Status.eq(NotificationStatus::Unread))
        .count(db)
        .await?;
    Ok(count)
}

/// Push freshly committed notifications: badge count first, then the entry itself.
pub async fn push_all(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    created: &[notification::Model],
) -> ServiceResult<()> {
    for item in created {
        let unread = unread_count(db, item.recipient_id).await?;
        hub.notify(item.recipient_id, unread, item).await;
        tracing::debug!(recipient = item.recipient_id, kind = ?item.kind, "notification pushed");
    }
    Ok(())
}

pub async fn list(
    db: &DatabaseConnection,
    user: &CurrentUser,
    page: Page,
) -> ServiceResult<Vec<notification::Model>> {
    let rows = notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(user.id))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .paginate(db, page.per_page)
        .fetch_page(page.index)
        .await?;
    Ok(rows)
}

async fn owned(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: i32,
) -> ServiceResult<notification::Model> {
    notification::Entity::find_by_id(id)
        .filter(notification::Column::RecipientId.eq(user.id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("notification"))
}

pub async fn set_status(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: i32,
    status: NotificationStatus,
) -> ServiceResult<notification::Model> {
    let mut am: notification::ActiveModel = owned(db, user, id).await?.into();
    am.status = Set(status);
    Ok(am.update(db).await?)
}

pub async fn mark_all_read(db: &DatabaseConnection, user: &CurrentUser) -> ServiceResult<u64> {
    let res = notification::Entity::update_many()
        .col_expr(
            notification::Column::Status,
            sea_orm::sea_query::Expr::value(NotificationStatus::Read),
        )
        .filter(notification::Column::RecipientId.eq(user.id))
        .filter(notification::Column::Status.eq(NotificationStatus::Unread))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn delete(db: &DatabaseConnection, user: &CurrentUser, id: i32) -> ServiceResult<()> {
    let found = owned(db, user, id).await?;
    notification::Entity::delete_by_id(found.id).exec(db).await?;
    Ok(())
}
