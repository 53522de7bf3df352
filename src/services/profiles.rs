use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use validator::Validate;

use super::blog::visibility_condition;
use super::{Page, activity, find_user, find_user_by_name, follows};
use crate::auth::CurrentUser;
use crate::entities::{post, user};
use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub user: user::Model,
    pub followers: u64,
    pub followings: u64,
    pub posts: u64,
    pub activities: u64,
    pub has_followed: bool,
}

#[derive(Debug, Clone, Validate)]
pub struct ProfileInput {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(length(min = 1, max = 80))]
    pub state: String,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub cover_image_url: Option<String>,
}

/// Post visibility for someone's profile page.
fn profile_posts_condition(owner_id: i32, viewer: Option<&CurrentUser>) -> Condition {
    Condition::all()
        .add(post::Column::AuthorId.eq(owner_id))
        .add(visibility_condition(viewer))
}

pub async fn profile(
    db: &DatabaseConnection,
    username: &str,
    viewer: Option<&CurrentUser>,
) -> ServiceResult<ProfileSummary> {
    let user = find_user_by_name(db, username).await?;
    let posts = post::Entity::find()
        .filter(profile_posts_condition(user.id, viewer))
        .count(db)
        .await?;
    let has_followed = match viewer {
        Some(v) => follows::is_following(db, v.id, user.id).await?,
        None => false,
    };
    Ok(ProfileSummary {
        followers: follows::followers_count(db, user.id).await?,
        followings: follows::followings_count(db, user.id).await?,
        activities: activity::activity_count(db, user.id).await?,
        posts,
        has_followed,
        user,
    })
}

pub async fn update_profile(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: ProfileInput,
) -> ServiceResult<user::Model> {
    input.validate()?;
    let mut am: user::ActiveModel = find_user(db, user.id).await?.into();
    am.first_name = Set(input.first_name);
    am.last_name = Set(input.last_name);
    am.state = Set(input.state);
    am.image_url = Set(input.image_url);
    am.cover_image_url = Set(input.cover_image_url);
    let updated = am.update(db).await?;
    tracing::info!(user_id = user.id, "profile updated");
    Ok(updated)
}

pub async fn user_posts(
    db: &DatabaseConnection,
    username: &str,
    viewer: Option<&CurrentUser>,
    page: Page,
) -> ServiceResult<Vec<post::Model>> {
    let owner = find_user_by_name(db, username).await?;
    let rows = post::Entity::find()
        .filter(profile_posts_condition(owner.id, viewer))
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .paginate(db, page.per_page)
        .fetch_page(page.index)
        .await?;
    Ok(rows)
}
