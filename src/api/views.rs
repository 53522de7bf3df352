//! Response and request shapes of the HTTP API, and the mapping from entity rows.

use chrono::{DateTime, Utc};
use poem_openapi::{Enum, Object};

use crate::entities::{
    ActionStatus, CommentStatus, NotificationKind, NotificationStatus, PostStatus, Role, category,
    notification, post, user, user_action,
};
use crate::services::posts::{CommentEntry, LikeState, PostDetails};
use crate::services::blog::EditablePost;
use crate::services::profiles::ProfileSummary;
use crate::services::recommended::RecommendedUser;

pub const SUCCESS: &str = "Success";

/// Outcome of a mutation
#[derive(Object, Debug, Clone)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: &str) -> Self {
        Self {
            status: SUCCESS.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleView {
    Administrator,
    Editor,
    Author,
    Contributor,
    User,
}

impl From<Role> for RoleView {
    fn from(role: Role) -> Self {
        match role {
            Role::Administrator => RoleView::Administrator,
            Role::Editor => RoleView::Editor,
            Role::Author => RoleView::Author,
            Role::Contributor => RoleView::Contributor,
            Role::User => RoleView::User,
        }
    }
}

impl From<RoleView> for Role {
    fn from(role: RoleView) -> Self {
        match role {
            RoleView::Administrator => Role::Administrator,
            RoleView::Editor => Role::Editor,
            RoleView::Author => Role::Author,
            RoleView::Contributor => Role::Contributor,
            RoleView::User => Role::User,
        }
    }
}

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatusView {
    Pending,
    Approved,
    Banned,
}

impl From<PostStatus> for PostStatusView {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Pending => PostStatusView::Pending,
            PostStatus::Approved => PostStatusView::Approved,
            PostStatus::Banned => PostStatusView::Banned,
        }
    }
}

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStatusView {
    Pending,
    Approved,
}

impl From<CommentStatus> for CommentStatusView {
    fn from(status: CommentStatus) -> Self {
        match status {
            CommentStatus::Pending => CommentStatusView::Pending,
            CommentStatus::Approved => CommentStatusView::Approved,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub state: String,
    pub image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub role: RoleView,
    pub is_blocked: bool,
}

impl From<&user::Model> for UserView {
    fn from(m: &user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username.clone(),
            first_name: m.first_name.clone(),
            last_name: m.last_name.clone(),
            state: m.state.clone(),
            image_url: m.image_url.clone(),
            cover_image_url: m.cover_image_url.clone(),
            role: m.role.into(),
            is_blocked: m.is_blocked,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Card shown in post listings
#[derive(Object, Debug, Clone)]
pub struct PostCard {
    pub id: i32,
    pub title: String,
    pub short_content: String,
    pub image_url: Option<String>,
    pub likes: i32,
    pub author_id: i32,
    pub category_id: i32,
    pub status: PostStatusView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&post::Model> for PostCard {
    fn from(m: &post::Model) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            short_content: m.short_content.clone(),
            image_url: m.image_url.clone(),
            likes: m.likes,
            author_id: m.author_id,
            category_id: m.category_id,
            status: m.status.into(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn cards(posts: &[post::Model]) -> Vec<PostCard> {
    posts.iter().map(PostCard::from).collect()
}

#[derive(Object, Debug, Clone)]
pub struct CommentView {
    pub id: i32,
    pub post_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub status: CommentStatusView,
    pub author: Option<UserView>,
    pub created_at: DateTime<Utc>,
}

impl From<&CommentEntry> for CommentView {
    fn from(entry: &CommentEntry) -> Self {
        let c = &entry.comment;
        Self {
            id: c.id,
            post_id: c.post_id,
            parent_id: c.parent_id,
            content: c.content.clone(),
            status: c.status.into(),
            author: entry.author.as_ref().map(UserView::from),
            created_at: c.created_at,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct PostDetailsView {
    pub post: PostCard,
    pub content: String,
    pub author: UserView,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub comments: Vec<CommentView>,
    pub likers: Vec<UserView>,
    pub is_liked: bool,
    pub is_author: bool,
    pub is_favourite: bool,
}

impl From<&PostDetails> for PostDetailsView {
    fn from(d: &PostDetails) -> Self {
        Self {
            post: PostCard::from(&d.post),
            content: d.post.content.clone(),
            author: UserView::from(&d.author),
            category: d.category.as_ref().map(|c: &category::Model| c.name.clone()),
            tags: d.tags.iter().map(|t| t.name.clone()).collect(),
            comments: d.comments.iter().map(CommentView::from).collect(),
            likers: d.likers.iter().map(UserView::from).collect(),
            is_liked: d.is_liked,
            is_author: d.is_author,
            is_favourite: d.is_favourite,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct EditPostView {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub category_name: String,
    pub tag_names: Vec<String>,
    pub image_url: Option<String>,
}

impl From<EditablePost> for EditPostView {
    fn from(p: EditablePost) -> Self {
        Self {
            id: p.id,
            title: p.title,
            content: p.content,
            category_name: p.category_name,
            tag_names: p.tag_names,
            image_url: p.image_url,
        }
    }
}

#[derive(Object, Debug, Clone, Copy)]
pub struct LikeView {
    pub liked: bool,
    pub likes: i32,
}

impl From<LikeState> for LikeView {
    fn from(s: LikeState) -> Self {
        Self {
            liked: s.liked,
            likes: s.likes,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct NotificationView {
    pub id: i32,
    pub kind: String,
    pub text: String,
    pub sender_id: i32,
    pub post_id: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

fn kind_name(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::NewPost => "NewPost",
        NotificationKind::FavouritePost => "FavouritePost",
        NotificationKind::Comment => "Comment",
        NotificationKind::ApprovedComment => "ApprovedComment",
        NotificationKind::Follow => "Follow",
        NotificationKind::ApprovedPost => "ApprovedPost",
        NotificationKind::BannedPost => "BannedPost",
        NotificationKind::UnbannedPost => "UnbannedPost",
    }
}

impl From<&notification::Model> for NotificationView {
    fn from(m: &notification::Model) -> Self {
        Self {
            id: m.id,
            kind: kind_name(m.kind).to_string(),
            text: m.text.clone(),
            sender_id: m.sender_id,
            post_id: m.post_id,
            status: match m.status {
                NotificationStatus::Unread => "Unread",
                NotificationStatus::Read => "Read",
                NotificationStatus::Pinned => "Pinned",
            }
            .to_string(),
            created_at: m.created_at,
        }
    }
}

#[derive(Object, Debug, Clone, Copy)]
pub struct CountView {
    pub count: u64,
}

#[derive(Object, Debug, Clone)]
pub struct ActivityView {
    pub id: i32,
    pub action_type: String,
    pub counterpart_id: Option<i32>,
    pub post_id: Option<i32>,
    pub title: Option<String>,
    pub short_content: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&user_action::Model> for ActivityView {
    fn from(m: &user_action::Model) -> Self {
        Self {
            id: m.id,
            action_type: format!("{:?}", m.action_type),
            counterpart_id: m.counterpart_id,
            post_id: m.post_id,
            title: m.title.clone(),
            short_content: m.short_content.clone(),
            is_read: m.status == ActionStatus::Read,
            created_at: m.created_at,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct ProfileView {
    pub user: UserView,
    pub followers: u64,
    pub followings: u64,
    pub posts: u64,
    pub activities: u64,
    pub has_followed: bool,
}

impl From<&ProfileSummary> for ProfileView {
    fn from(p: &ProfileSummary) -> Self {
        Self {
            user: UserView::from(&p.user),
            followers: p.followers,
            followings: p.followings,
            posts: p.posts,
            activities: p.activities,
            has_followed: p.has_followed,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct RecommendedView {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub followers_count: u64,
    pub followings_count: u64,
    pub has_followed: bool,
    pub activities: u64,
}

impl From<&RecommendedUser> for RecommendedView {
    fn from(r: &RecommendedUser) -> Self {
        Self {
            id: r.friend.recommended_user_id,
            username: r.friend.username.clone(),
            first_name: r.friend.first_name.clone(),
            last_name: r.friend.last_name.clone(),
            image_url: r.friend.image_url.clone(),
            cover_image_url: r.friend.cover_image_url.clone(),
            followers_count: r.followers_count,
            followings_count: r.followings_count,
            has_followed: r.has_followed,
            activities: r.activities,
        }
    }
}

// requests

#[derive(Object, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub state: String,
}

#[derive(Object, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Object, Debug, Clone)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    pub category_name: String,
    #[oai(default)]
    pub tag_names: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Object, Debug, Clone)]
pub struct CommentRequest {
    pub content: String,
    pub parent_id: Option<i32>,
}

#[derive(Object, Debug, Clone)]
pub struct ProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub state: String,
    pub image_url: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Object, Debug, Clone)]
pub struct CategoryRequest {
    pub name: String,
    #[oai(default)]
    pub description: String,
}

#[derive(Object, Debug, Clone)]
pub struct TagRequest {
    pub name: String,
}

#[derive(Object, Debug, Clone)]
pub struct RoleRequest {
    pub role: RoleView,
}

#[derive(Object, Debug, Clone, Copy)]
pub struct RebuildView {
    pub written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserActionType;

    #[test]
    fn test_role_mapping_both_ways() {
        for role in [Role::Administrator, Role::Editor, Role::Author, Role::Contributor, Role::User] {
            assert_eq!(Role::from(RoleView::from(role)), role);
        }
    }

    #[test]
    fn test_activity_view_names_action() {
        let m = user_action::Model {
            id: 1,
            user_id: 2,
            counterpart_id: Some(3),
            post_id: None,
            action_type: UserActionType::DeleteOwnPost,
            status: ActionStatus::Read,
            title: Some("Gone".into()),
            short_content: None,
            created_at: Utc::now(),
        };
        let view = ActivityView::from(&m);
        assert_eq!(view.action_type, "DeleteOwnPost");
        assert!(view.is_read);
    }
}
