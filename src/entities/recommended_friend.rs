//! Snapshot of a suggested user, rebuilt by the maintenance task.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recommended_friends")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub user_id: i32,
    pub recommended_user_id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub cover_image_url: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecommendedUserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recommended,
}

impl ActiveModelBehavior for ActiveModel {}
