//! Per-user notification inbox entries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum NotificationKind {
    #[sea_orm(string_value = "new_post")]
    NewPost,
    #[sea_orm(string_value = "favourite_post")]
    FavouritePost,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "approved_comment")]
    ApprovedComment,
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "approved_post")]
    ApprovedPost,
    #[sea_orm(string_value = "banned_post")]
    BannedPost,
    #[sea_orm(string_value = "unbanned_post")]
    UnbannedPost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum NotificationStatus {
    #[sea_orm(string_value = "unread")]
    Unread,
    #[sea_orm(string_value = "read")]
    Read,
    #[sea_orm(string_value = "pinned")]
    Pinned,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub recipient_id: i32,
    pub sender_id: i32,
    pub kind: NotificationKind,
    pub text: String,
    /// Post the notification links to; not a foreign key so it outlives the post
    pub post_id: Option<i32>,
    pub status: NotificationStatus,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
