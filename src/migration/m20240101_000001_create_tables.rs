use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entities::{
    blocked_post, category, comment, favourite_post, follow, notification, pending_post, post,
    post_like, post_tag, recommended_friend, tag, user, user_action,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create<E: EntityTrait>(manager: &SchemaManager<'_>, schema: &Schema, entity: E) -> Result<(), DbErr> {
    manager.create_table(schema.create_table_from_entity(entity)).await?;
    for index in schema.create_index_from_entity(entity) {
        manager.create_index(index).await?;
    }
    Ok(())
}

async fn unique_pair<T, C>(manager: &SchemaManager<'_>, name: &str, table: T, a: C, b: C) -> Result<(), DbErr>
where
    T: IntoTableRef,
    C: IntoIden,
{
    manager
        .create_index(
            Index::create()
                .name(name)
                .table(table)
                .col(a)
                .col(b)
                .unique()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // referenced tables first
        create(manager, &schema, user::Entity).await?;
        create(manager, &schema, category::Entity).await?;
        create(manager, &schema, tag::Entity).await?;
        create(manager, &schema, post::Entity).await?;
        create(manager, &schema, post_tag::Entity).await?;
        create(manager, &schema, comment::Entity).await?;
        create(manager, &schema, post_like::Entity).await?;
        create(manager, &schema, favourite_post::Entity).await?;
        create(manager, &schema, pending_post::Entity).await?;
        create(manager, &schema, blocked_post::Entity).await?;
        create(manager, &schema, follow::Entity).await?;
        create(manager, &schema, notification::Entity).await?;
        create(manager, &schema, user_action::Entity).await?;
        create(manager, &schema, recommended_friend::Entity).await?;

        unique_pair(
            manager,
            "uq_posts_likes_user_post",
            post_like::Entity,
            post_like::Column::UserId,
            post_like::Column::PostId,
        )
        .await?;
        unique_pair(
            manager,
            "uq_favourite_posts_user_post",
            favourite_post::Entity,
            favourite_post::Column::UserId,
            favourite_post::Column::PostId,
        )
        .await?;
        unique_pair(
            manager,
            "uq_follows_pair",
            follow::Entity,
            follow::Column::FollowerId,
            follow::Column::FolloweeId,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        macro_rules! drop_all {
            ($($entity:path),* $(,)?) => {
                $(manager.drop_table(Table::drop().table($entity).if_exists().to_owned()).await?;)*
            };
        }

        drop_all!(
            recommended_friend::Entity,
            user_action::Entity,
            notification::Entity,
            follow::Entity,
            blocked_post::Entity,
            pending_post::Entity,
            favourite_post::Entity,
            post_like::Entity,
            comment::Entity,
            post_tag::Entity,
            post::Entity,
            tag::Entity,
            category::Entity,
            user::Entity,
        );
        Ok(())
    }
}
