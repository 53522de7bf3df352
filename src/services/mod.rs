//! Business operations. Each mutating call is one unit of work: load, change,
//! commit, then push hub messages for the notifications it created.

pub mod accounts;
pub mod activity;
pub mod blog;
pub mod comments;
pub mod follows;
pub mod moderation;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod recommended;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::auth::CurrentUser;
use crate::entities::{PostStatus, post, user};
use crate::error::{ServiceError, ServiceResult};

/// Zero-based page plus page size, clamped the same way for every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub index: u64,
    pub per_page: u64,
}

impl Page {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            index: page.unwrap_or(1).max(1) - 1,
            per_page: per_page.unwrap_or(20).clamp(1, 100),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

pub(crate) async fn find_post<C: ConnectionTrait>(db: &C, id: i32) -> ServiceResult<post::Model> {
    post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("post"))
}

pub(crate) async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> ServiceResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))
}

pub(crate) async fn find_user_by_name<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> ServiceResult<user::Model> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))
}

/// Banned posts are for moderators only; pending ones also for their author.
pub fn can_view(post: &post::Model, viewer: Option<&CurrentUser>) -> bool {
    match post.status {
        PostStatus::Approved => true,
        PostStatus::Banned => viewer.is_some_and(CurrentUser::is_privileged),
        PostStatus::Pending => viewer.is_some_and(|v| v.is_privileged() || v.id == post.author_id),
    }
}

/// Load a post the viewer may read; hidden posts look missing.
pub(crate) async fn find_visible_post<C: ConnectionTrait>(
    db: &C,
    id: i32,
    viewer: Option<&CurrentUser>,
) -> ServiceResult<post::Model> {
    let post = find_post(db, id).await?;
    if can_view(&post, viewer) {
        Ok(post)
    } else {
        Err(ServiceError::not_found("post"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Role;
    use chrono::Utc;

    fn post_with(status: PostStatus) -> post::Model {
        post::Model {
            id: 1,
            title: "t".into(),
            content: "c".into(),
            short_content: "c".into(),
            image_url: None,
            likes: 0,
            author_id: 10,
            category_id: 1,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn viewer(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user{id}"),
            role,
        }
    }

    #[test]
    fn test_page_clamping() {
        assert_eq!(Page::new(None, None), Page { index: 0, per_page: 20 });
        assert_eq!(Page::new(Some(0), Some(1000)), Page { index: 0, per_page: 100 });
        assert_eq!(Page::new(Some(3), Some(0)), Page { index: 2, per_page: 1 });
    }

    #[test]
    fn test_visibility_rules() {
        let author = viewer(10, Role::User);
        let stranger = viewer(11, Role::User);
        let editor = viewer(12, Role::Editor);

        let approved = post_with(PostStatus::Approved);
        assert!(can_view(&approved, None));

        let pending = post_with(PostStatus::Pending);
        assert!(!can_view(&pending, None));
        assert!(can_view(&pending, Some(&author)));
        assert!(!can_view(&pending, Some(&stranger)));
        assert!(can_view(&pending, Some(&editor)));

        let banned = post_with(PostStatus::Banned);
        assert!(!can_view(&banned, Some(&author)));
        assert!(can_view(&banned, Some(&editor)));
    }
}
