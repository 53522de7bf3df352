use std::sync::Arc;

use poem::{Endpoint, EndpointExt, Request, Route, get, http::header, middleware::Cors};
use poem_openapi::{OpenApiService, SecurityScheme, Tags, auth::Bearer};
use sea_orm::DatabaseConnection;

use crate::auth::{CurrentUser, JwtKeys, authenticate};
use crate::error::ServiceResult;
use crate::hub::NotificationHub;

mod accounts;
mod admin;
mod hub;
mod notifications;
mod posts;
mod profiles;
pub mod views;

pub struct AppState {
    pub db: DatabaseConnection,
    pub hub: NotificationHub,
    pub keys: JwtKeys,
}

impl AppState {
    pub fn new(db: DatabaseConnection, keys: JwtKeys) -> Self {
        Self {
            db,
            hub: NotificationHub::new(),
            keys,
        }
    }

    pub async fn authenticate(&self, token: &str) -> ServiceResult<CurrentUser> {
        authenticate(&self.db, &self.keys, token).await
    }

    pub async fn current_user(&self, auth: &BearerAuth) -> ServiceResult<CurrentUser> {
        self.authenticate(&auth.0.token).await
    }

    /// Bearer header is optional on public reads; a bad token is still an error.
    pub async fn viewer(&self, req: &Request) -> ServiceResult<Option<CurrentUser>> {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match token {
            Some(token) => Ok(Some(self.authenticate(token.trim()).await?)),
            None => Ok(None),
        }
    }
}

#[derive(Tags)]
pub enum ApiTags {
    /// Registration and sign-in
    Auth,
    Posts,
    Comments,
    Profiles,
    Notifications,
    /// Moderation and site maintenance
    Admin,
}

/// JWT issued by `/auth/login`
#[derive(SecurityScheme)]
#[oai(ty = "bearer")]
pub struct BearerAuth(Bearer);

pub fn build_app(state: Arc<AppState>) -> impl Endpoint {
    let api = OpenApiService::new(
        (
            accounts::AccountApi { state: state.clone() },
            posts::PostApi { state: state.clone() },
            profiles::ProfileApi { state: state.clone() },
            notifications::NotificationApi { state: state.clone() },
            admin::AdminApi { state: state.clone() },
        ),
        "Blog API",
        "1.0",
    )
    .server("/api");
    let ui = api.swagger_ui();

    Route::new()
        .nest("/api", api)
        .nest("/docs", ui)
        .at("/hub/notifications", get(hub::notifications_ws))
        .with(Cors::new()) // 필요 시 설정 강화
        .data(state)
}
