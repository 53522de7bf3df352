#![allow(dead_code)]

use chrono::Utc;
use poem_blog_api::auth::CurrentUser;
use poem_blog_api::entities::{Role, category, tag, user};
use poem_blog_api::hub::NotificationHub;
use poem_blog_api::migration::Migrator;
use poem_blog_api::services::accounts::{self, RegisterInput};
use poem_blog_api::services::blog::{self, PostInput};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

pub struct TestEnv {
    pub db: DatabaseConnection,
    pub hub: NotificationHub,
}

/// Fresh in-memory database with the schema, one category and a few tags.
pub async fn setup() -> TestEnv {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    category::ActiveModel {
        name: Set("General".into()),
        description: Set("Everything else".into()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    for name in ["Rust", "Web", "Databases"] {
        tag::ActiveModel {
            name: Set(name.into()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
    }

    TestEnv {
        db,
        hub: NotificationHub::new(),
    }
}

pub async fn user_in(env: &TestEnv, username: &str, role: Role, state: &str) -> CurrentUser {
    let created = accounts::register(
        &env.db,
        RegisterInput {
            username: username.into(),
            email: format!("{username}@example.com"),
            password: "password123".into(),
            first_name: username.into(),
            last_name: "Tester".into(),
            state: state.into(),
        },
    )
    .await
    .unwrap();
    let mut am: user::ActiveModel = created.into();
    am.role = Set(role);
    let updated = am.update(&env.db).await.unwrap();
    CurrentUser::from(&updated)
}

pub async fn user(env: &TestEnv, username: &str, role: Role) -> CurrentUser {
    user_in(env, username, role, "Sofia").await
}

pub fn post_input(title: &str, content: &str) -> PostInput {
    PostInput {
        title: title.into(),
        content: content.into(),
        category_name: "General".into(),
        tag_names: vec!["rust".into()],
        image_url: None,
    }
}

pub async fn publish(env: &TestEnv, author: &CurrentUser, title: &str) -> poem_blog_api::entities::post::Model {
    blog::create_post(&env.db, &env.hub, author, post_input(title, "<p>Body of the post</p>"))
        .await
        .unwrap()
}
