//! Profile activity feed.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    Iterable, PaginatorTrait, QueryFilter, QueryOrder, Set, sea_query::Expr,
};

use super::Page;
use crate::entities::{ActionStatus, UserActionType, post, user_action};
use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct NewAction {
    pub user_id: i32,
    pub counterpart_id: Option<i32>,
    pub post_id: Option<i32>,
    pub action_type: UserActionType,
    pub title: Option<String>,
    pub short_content: Option<String>,
}

impl NewAction {
    pub fn new(user_id: i32, action_type: UserActionType, counterpart_id: i32) -> Self {
        Self {
            user_id,
            counterpart_id: Some(counterpart_id),
            post_id: None,
            action_type,
            title: None,
            short_content: None,
        }
    }

    /// Action about a post, carrying its title and summary.
    pub fn on_post(
        user_id: i32,
        action_type: UserActionType,
        counterpart_id: i32,
        post: &post::Model,
    ) -> Self {
        Self {
            post_id: Some(post.id),
            title: Some(post.title.clone()),
            short_content: Some(post.short_content.clone()),
            ..Self::new(user_id, action_type, counterpart_id)
        }
    }

    /// Snapshot of a post that is about to disappear.
    pub fn snapshot(self) -> Self {
        Self {
            post_id: None,
            ..self
        }
    }
}

pub async fn add_action<C: ConnectionTrait>(
    db: &C,
    action: NewAction,
) -> ServiceResult<user_action::Model> {
    let created = user_action::ActiveModel {
        user_id: Set(action.user_id),
        counterpart_id: Set(action.counterpart_id),
        post_id: Set(action.post_id),
        action_type: Set(action.action_type),
        status: Set(ActionStatus::Unread),
        title: Set(action.title),
        short_content: Set(action.short_content),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created)
}

fn cycle_of(action_type: UserActionType) -> Vec<UserActionType> {
    if action_type.is_like_cycle() {
        UserActionType::iter().filter(|t| t.is_like_cycle()).collect()
    } else if action_type.is_follow_cycle() {
        UserActionType::iter().filter(|t| t.is_follow_cycle()).collect()
    } else {
        vec![action_type]
    }
}

fn optional_eq(column: user_action::Column, value: Option<i32>) -> Condition {
    match value {
        Some(v) => Condition::all().add(column.eq(v)),
        None => Condition::all().add(column.is_null()),
    }
}

/// Replace the previous entry of the same like or follow cycle, then add this one.
pub async fn add_cyclic_action<C: ConnectionTrait>(
    db: &C,
    action: NewAction,
) -> ServiceResult<user_action::Model> {
    user_action::Entity::delete_many()
        .filter(user_action::Column::UserId.eq(action.user_id))
        .filter(optional_eq(user_action::Column::CounterpartId, action.counterpart_id))
        .filter(optional_eq(user_action::Column::PostId, action.post_id))
        .filter(user_action::Column::ActionType.is_in(cycle_of(action.action_type)))
        .exec(db)
        .await?;
    add_action(db, action).await
}

pub async fn delete_post_actions<C: ConnectionTrait>(db: &C, post_id: i32) -> ServiceResult<u64> {
    let res = user_action::Entity::delete_many()
        .filter(user_action::Column::PostId.eq(post_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn activities(
    db: &DatabaseConnection,
    user_id: i32,
    page: Page,
) -> ServiceResult<Vec<user_action::Model>> {
    let rows = user_action::Entity::find()
        .filter(user_action::Column::UserId.eq(user_id))
        .order_by_desc(user_action::Column::CreatedAt)
        .order_by_desc(user_action::Column::Id)
        .paginate(db, page.per_page)
        .fetch_page(page.index)
        .await?;
    Ok(rows)
}

pub async fn activity_count<C: ConnectionTrait>(db: &C, user_id: i32) -> ServiceResult<u64> {
    Ok(user_action::Entity::find()
        .filter(user_action::Column::UserId.eq(user_id))
        .count(db)
        .await?)
}

pub async fn mark_read(db: &DatabaseConnection, user_id: i32) -> ServiceResult<u64> {
    let res = user_action::Entity::update_many()
        .col_expr(user_action::Column::Status, Expr::value(ActionStatus::Read))
        .filter(user_action::Column::UserId.eq(user_id))
        .filter(user_action::Column::Status.eq(ActionStatus::Unread))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

/// Maintenance: drop follow/unfollow entries their owners have already seen.
pub async fn delete_read_follow_actions(db: &DatabaseConnection) -> ServiceResult<u64> {
    let follow_types: Vec<UserActionType> = UserActionType::iter()
        .filter(|t| t.is_follow_cycle())
        .collect();
    let res = user_action::Entity::delete_many()
        .filter(user_action::Column::ActionType.is_in(follow_types))
        .filter(user_action::Column::Status.eq(ActionStatus::Read))
        .exec(db)
        .await?;
    tracing::info!(removed = res.rows_affected, "read follow activities removed");
    Ok(res.rows_affected)
}
