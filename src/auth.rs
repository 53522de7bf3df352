//! Password hashing, access tokens and role checks.

use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::entities::{Role, user};
use crate::error::{ServiceError, ServiceResult};

pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub username: String,
    pub role: Role,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, user: &user::Model) -> ServiceResult<String> {
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: Utc::now().timestamp() + self.ttl_secs,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

/// The signed-in user as seen by services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    pub fn require_privileged(&self) -> ServiceResult<()> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(ServiceError::forbidden("administrator or editor role required"))
        }
    }

    pub fn require_admin(&self) -> ServiceResult<()> {
        if self.role == Role::Administrator {
            Ok(())
        } else {
            Err(ServiceError::forbidden("administrator role required"))
        }
    }

    /// Privileged users and the owner may change a post or comment.
    pub fn can_manage(&self, owner_id: i32) -> bool {
        self.is_privileged() || self.id == owner_id
    }
}

impl From<&user::Model> for CurrentUser {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            role: model.role,
        }
    }
}

/// Resolve a token to a live, unblocked account. The role is re-read from the store.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    keys: &JwtKeys,
    token: &str,
) -> ServiceResult<CurrentUser> {
    let claims = keys.verify(token)?;
    let account = user::Entity::find_by_id(claims.sub)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("account no longer exists".into()))?;
    if account.is_blocked {
        return Err(ServiceError::forbidden("account is blocked"));
    }
    Ok(CurrentUser::from(&account))
}
