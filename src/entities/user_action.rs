//! Activity feed entries shown on a user's profile.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserActionType {
    #[sea_orm(string_value = "create_post")]
    CreatePost,
    #[sea_orm(string_value = "edit_own_post")]
    EditOwnPost,
    #[sea_orm(string_value = "edit_post")]
    EditPost,
    #[sea_orm(string_value = "edited_post")]
    EditedPost,
    #[sea_orm(string_value = "delete_own_post")]
    DeleteOwnPost,
    #[sea_orm(string_value = "delete_post")]
    DeletePost,
    #[sea_orm(string_value = "deleted_post")]
    DeletedPost,
    #[sea_orm(string_value = "like_own_post")]
    LikeOwnPost,
    #[sea_orm(string_value = "like_post")]
    LikePost,
    #[sea_orm(string_value = "liked_post")]
    LikedPost,
    #[sea_orm(string_value = "unlike_own_post")]
    UnlikeOwnPost,
    #[sea_orm(string_value = "unlike_post")]
    UnlikePost,
    #[sea_orm(string_value = "unliked_post")]
    UnlikedPost,
    #[sea_orm(string_value = "create_comment")]
    CreateComment,
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "followed")]
    Followed,
    #[sea_orm(string_value = "unfollow")]
    Unfollow,
    #[sea_orm(string_value = "unfollowed")]
    Unfollowed,
}

impl UserActionType {
    pub fn is_like_cycle(self) -> bool {
        use UserActionType::*;
        matches!(
            self,
            LikeOwnPost | LikePost | LikedPost | UnlikeOwnPost | UnlikePost | UnlikedPost
        )
    }

    pub fn is_follow_cycle(self) -> bool {
        use UserActionType::*;
        matches!(self, Follow | Followed | Unfollow | Unfollowed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ActionStatus {
    #[sea_orm(string_value = "unread")]
    Unread,
    #[sea_orm(string_value = "read")]
    Read,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_actions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owner of the feed entry
    #[sea_orm(indexed)]
    pub user_id: i32,
    /// The other party of the action, if any
    pub counterpart_id: Option<i32>,
    pub post_id: Option<i32>,
    pub action_type: UserActionType,
    pub status: ActionStatus,
    /// Snapshot of the post title, kept after the post is gone
    pub title: Option<String>,
    pub short_content: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
