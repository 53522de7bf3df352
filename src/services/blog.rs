//! Post lifecycle: create, edit, delete, list, plus categories and tags.

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func},
};
use validator::Validate;

use super::activity::{self, NewAction};
use super::{Page, find_post, notifications};
use crate::auth::CurrentUser;
use crate::entities::{
    NotificationKind, PostStatus, Role, UserActionType, blocked_post, category, comment, follow,
    pending_post, post, post_tag, tag, user,
};
use crate::error::{ServiceError, ServiceResult};
use crate::hub::NotificationHub;
use crate::text;

#[derive(Debug, Clone, Validate)]
pub struct PostInput {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    pub category_name: String,
    pub tag_names: Vec<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Fields needed to prefill the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditablePost {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub category_name: String,
    pub tag_names: Vec<String>,
    pub image_url: Option<String>,
}

async fn category_by_name<C: ConnectionTrait>(db: &C, name: &str) -> ServiceResult<category::Model> {
    category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::invalid(format!("unknown category '{name}'")))
}

/// Tag names match case-insensitively; duplicates collapse.
async fn tags_by_name<C: ConnectionTrait>(db: &C, names: &[String]) -> ServiceResult<Vec<tag::Model>> {
    let mut found: Vec<tag::Model> = Vec::with_capacity(names.len());
    for name in names {
        let lowered = name.trim().to_lowercase();
        let tag = tag::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(tag::Column::Name))).eq(lowered))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::invalid(format!("unknown tag '{name}'")))?;
        if !found.iter().any(|t| t.id == tag.id) {
            found.push(tag);
        }
    }
    Ok(found)
}

async fn attach_tags<C: ConnectionTrait>(db: &C, post_id: i32, tags: &[tag::Model]) -> ServiceResult<()> {
    if tags.is_empty() {
        return Ok(());
    }
    let rows = tags.iter().map(|t| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(t.id),
    });
    post_tag::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

pub(crate) async fn moderator_ids<C: ConnectionTrait>(db: &C) -> ServiceResult<Vec<i32>> {
    let ids = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Role.is_in([Role::Administrator, Role::Editor]))
        .into_tuple::<i32>()
        .all(db)
        .await?;
    Ok(ids)
}

pub(crate) async fn follower_ids<C: ConnectionTrait>(db: &C, user_id: i32) -> ServiceResult<Vec<i32>> {
    let ids = follow::Entity::find()
        .select_only()
        .column(follow::Column::FollowerId)
        .filter(follow::Column::FolloweeId.eq(user_id))
        .filter(follow::Column::IsFollowed.eq(true))
        .into_tuple::<i32>()
        .all(db)
        .await?;
    Ok(ids)
}

/// One `NewPost` notification per recipient, the author excluded.
pub(crate) async fn fan_out_new_post<C: ConnectionTrait>(
    db: &C,
    post: &post::Model,
    recipients: impl IntoIterator<Item = i32>,
) -> ServiceResult<Vec<crate::entities::notification::Model>> {
    let unique: BTreeSet<i32> = recipients
        .into_iter()
        .filter(|id| *id != post.author_id)
        .collect();
    let mut created = Vec::with_capacity(unique.len());
    for recipient in unique {
        created.push(
            notifications::add_notification(
                db,
                recipient,
                post.author_id,
                NotificationKind::NewPost,
                &post.short_content,
                Some(post.id),
            )
            .await?,
        );
    }
    Ok(created)
}

pub async fn create_post(
    db: &DatabaseConnection,
    hub: &NotificationHub,
    author: &CurrentUser,
    input: PostInput,
) -> ServiceResult<post::Model> {
    input.validate()?;
    let txn = db.begin().await?;

    let category = category_by_name(&txn, &input.category_name).await?;
    let tags = tags_by_name(&txn, &input.tag_names).await?;
    let status = if author.role.is_blog_role() {
        PostStatus::Approved
    } else {
        PostStatus::Pending
    };
    let now = Utc::now();

    let post = post::ActiveModel {
        title: Set(input.title),
        short_content: Set(text::short_content(&input.content)),
        content: Set(input.content),
        image_url: Set(input.image_url),
        likes: Set(0),
        author_id: Set(author.id),
        category_id: Set(category.id),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    attach_tags(&txn, post.id, &tags).await?;

    if status == PostStatus::Pending {
        pending_post::ActiveModel {
            post_id: Set(post.id),
            author_id: Set(author.id),
            is_pending: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    blocked_post::ActiveModel {
        post_id: Set(post.id),
        author_id: Set(author.id),
        is_blocked: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    activity::add_action(
        &txn,
        NewAction::on_post(author.id, UserActionType::CreatePost, author.id, &post),
    )
    .await?;

    let mut recipients = moderator_ids(&txn).await?;
    if status == PostStatus::Approved {
        recipients.extend(follower_ids(&txn, author.id).await?);
    }
    let created = fan_out_new_post(&txn, &post, recipients).await?;

    txn.commit().await?;
    tracing::info!(post_id = post.id, author = author.id, status = ?status, "post created");
    notifications::push_all(db, hub, &created).await?;
    Ok(post)
}

pub async fn edit_post(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: i32,
    input: PostInput,
) -> ServiceResult<post::Model> {
    input.validate()?;
    let txn = db.begin().await?;

    let found = find_post(&txn, id).await?;
    if !user.can_manage(found.author_id) {
        return Err(ServiceError::forbidden("only the author or a moderator may edit this post"));
    }
    let category = category_by_name(&txn, &input.category_name).await?;
    let author_id = found.author_id;

    let mut am: post::ActiveModel = found.into();
    am.short_content = Set(text::short_content(&input.content));
    am.title = Set(input.title);
    am.content = Set(input.content);
    am.category_id = Set(category.id);
    am.updated_at = Set(Utc::now());
    if let Some(url) = input.image_url {
        am.image_url = Set(Some(url));
    }
    let updated = am.update(&txn).await?;

    if !input.tag_names.is_empty() {
        let tags = tags_by_name(&txn, &input.tag_names).await?;
        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(updated.id))
            .exec(&txn)
            .await?;
        attach_tags(&txn, updated.id, &tags).await?;
    }

    if user.id == author_id {
        activity::add_action(
            &txn,
            NewAction::on_post(user.id, UserActionType::EditOwnPost, user.id, &updated),
        )
        .await?;
    } else {
        activity::add_action(
            &txn,
            NewAction::on_post(user.id, UserActionType::EditPost, author_id, &updated),
        )
        .await?;
        activity::add_action(
            &txn,
            NewAction::on_post(author_id, UserActionType::EditedPost, user.id, &updated),
        )
        .await?;
    }

    txn.commit().await?;
    tracing::info!(post_id = updated.id, editor = user.id, "post edited");
    Ok(updated)
}

pub async fn delete_post(db: &DatabaseConnection, user: &CurrentUser, id: i32) -> ServiceResult<()> {
    let txn = db.begin().await?;

    let found = find_post(&txn, id).await?;
    if !user.can_manage(found.author_id) {
        return Err(ServiceError::forbidden("only the author or a moderator may delete this post"));
    }

    activity::delete_post_actions(&txn, found.id).await?;
    if user.id == found.author_id {
        activity::add_action(
            &txn,
            NewAction::on_post(user.id, UserActionType::DeleteOwnPost, user.id, &found).snapshot(),
        )
        .await?;
    } else {
        activity::add_action(
            &txn,
            NewAction::on_post(user.id, UserActionType::DeletePost, found.author_id, &found)
                .snapshot(),
        )
        .await?;
        activity::add_action(
            &txn,
            NewAction::on_post(found.author_id, UserActionType::DeletedPost, user.id, &found)
                .snapshot(),
        )
        .await?;
    }

    comment::Entity::delete_many()
        .filter(comment::Column::PostId.eq(found.id))
        .exec(&txn)
        .await?;
    let post_id = found.id;
    found.delete(&txn).await?;

    txn.commit().await?;
    tracing::info!(post_id, by = user.id, "post deleted");
    Ok(())
}

/// Visibility filter shared by the post listings.
pub(crate) fn visibility_condition(viewer: Option<&CurrentUser>) -> Condition {
    match viewer {
        Some(v) if v.is_privileged() => Condition::all(),
        Some(v) => Condition::any()
            .add(post::Column::Status.eq(PostStatus::Approved))
            .add(post::Column::AuthorId.eq(v.id)),
        None => Condition::all().add(post::Column::Status.eq(PostStatus::Approved)),
    }
}

pub async fn list_posts(
    db: &DatabaseConnection,
    viewer: Option<&CurrentUser>,
    search: Option<&str>,
    page: Page,
) -> ServiceResult<Vec<post::Model>> {
    let mut query = post::Entity::find().filter(visibility_condition(viewer));
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(post::Column::Title.contains(term))
                .add(post::Column::ShortContent.contains(term))
                .add(post::Column::Content.contains(term)),
        );
    }
    let rows = query
        .order_by_desc(post::Column::UpdatedAt)
        .order_by_desc(post::Column::Id)
        .paginate(db, page.per_page)
        .fetch_page(page.index)
        .await?;
    Ok(rows)
}

pub async fn post_for_edit(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: i32,
) -> ServiceResult<EditablePost> {
    let found = find_post(db, id).await?;
    if !user.can_manage(found.author_id) {
        return Err(ServiceError::forbidden("only the author or a moderator may edit this post"));
    }
    let category = found
        .find_related(category::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("category"))?;
    let tag_names = found
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();
    Ok(EditablePost {
        id: found.id,
        title: found.title,
        content: found.content,
        category_name: category.name,
        tag_names,
        image_url: found.image_url,
    })
}

pub async fn category_names(db: &DatabaseConnection) -> ServiceResult<Vec<String>> {
    let names = category::Entity::find()
        .select_only()
        .column(category::Column::Name)
        .order_by_asc(category::Column::Name)
        .into_tuple::<String>()
        .all(db)
        .await?;
    Ok(names)
}

pub async fn tag_names(db: &DatabaseConnection) -> ServiceResult<Vec<String>> {
    let names = tag::Entity::find()
        .select_only()
        .column(tag::Column::Name)
        .order_by_asc(tag::Column::Name)
        .into_tuple::<String>()
        .all(db)
        .await?;
    Ok(names)
}

pub async fn create_category(
    db: &DatabaseConnection,
    admin: &CurrentUser,
    name: &str,
    description: &str,
) -> ServiceResult<category::Model> {
    admin.require_admin()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid("category name is required"));
    }
    let exists = category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .count(db)
        .await?
        > 0;
    if exists {
        return Err(ServiceError::Conflict(format!("category '{name}' already exists")));
    }
    Ok(category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn create_tag(db: &DatabaseConnection, admin: &CurrentUser, name: &str) -> ServiceResult<tag::Model> {
    admin.require_admin()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid("tag name is required"));
    }
    let exists = tag::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(tag::Column::Name))).eq(name.to_lowercase()))
        .count(db)
        .await?
        > 0;
    if exists {
        return Err(ServiceError::Conflict(format!("tag '{name}' already exists")));
    }
    Ok(tag::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}
