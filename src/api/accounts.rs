use std::sync::Arc;

use poem_openapi::{OpenApi, payload::Json};

use super::views::{AuthResponse, LoginRequest, RegisterRequest, UserView};
use super::{ApiTags, AppState};
use crate::services::accounts::{self, RegisterInput};

pub struct AccountApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Auth")]
impl AccountApi {
    /// 회원가입
    #[oai(path = "/auth/register", method = "post")]
    async fn register(&self, Json(input): Json<RegisterRequest>) -> poem::Result<Json<AuthResponse>> {
        let created = accounts::register(
            &self.state.db,
            RegisterInput {
                username: input.username,
                email: input.email,
                password: input.password,
                first_name: input.first_name,
                last_name: input.last_name,
                state: input.state,
            },
        )
        .await?;
        let token = self.state.keys.issue(&created)?;
        Ok(Json(AuthResponse {
            token,
            user: UserView::from(&created),
        }))
    }

    /// 로그인
    #[oai(path = "/auth/login", method = "post")]
    async fn login(&self, Json(input): Json<LoginRequest>) -> poem::Result<Json<AuthResponse>> {
        let (token, user) =
            accounts::login(&self.state.db, &self.state.keys, &input.username, &input.password).await?;
        Ok(Json(AuthResponse {
            token,
            user: UserView::from(&user),
        }))
    }
}
