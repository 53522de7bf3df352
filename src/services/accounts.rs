//! Registration and sign-in.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IsolationLevel,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use validator::Validate;

use crate::auth::{JwtKeys, hash_password, verify_password};
use crate::entities::{Role, user};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(length(min = 1, max = 80))]
    pub state: String,
}

/// The very first account administers the site; everyone else starts as a plain user.
/// The emptiness check and the insert share one serializable transaction.
pub async fn register(db: &DatabaseConnection, input: RegisterInput) -> ServiceResult<user::Model> {
    input.validate()?;
    let password_hash = hash_password(&input.password)?;

    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;
    let taken = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(input.username.as_str()))
                .add(user::Column::Email.eq(input.email.as_str())),
        )
        .count(&txn)
        .await?
        > 0;
    if taken {
        return Err(ServiceError::Conflict("username or email already registered".into()));
    }

    let role = if user::Entity::find().count(&txn).await? == 0 {
        Role::Administrator
    } else {
        Role::User
    };
    // racing duplicates hit the unique index and surface as Conflict
    let created = user::ActiveModel {
        username: Set(input.username),
        email: Set(input.email),
        password_hash: Set(password_hash),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        state: Set(input.state),
        image_url: Set(None),
        cover_image_url: Set(None),
        role: Set(role),
        is_blocked: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    tracing::info!(user_id = created.id, role = ?role, "account registered");
    Ok(created)
}

pub async fn login(
    db: &DatabaseConnection,
    keys: &JwtKeys,
    username: &str,
    password: &str,
) -> ServiceResult<(String, user::Model)> {
    let account = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .filter(|u| verify_password(password, &u.password_hash))
        .ok_or_else(|| ServiceError::Unauthorized("invalid username or password".into()))?;
    if account.is_blocked {
        return Err(ServiceError::forbidden("account is blocked"));
    }
    let token = keys.issue(&account)?;
    Ok((token, account))
}
