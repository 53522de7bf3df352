use std::sync::Arc;

use poem_openapi::{OpenApi, param::Path, payload::Json};

use super::views::{
    CommentView, PostCard, RebuildView, RoleRequest, StatusResponse, UserView, cards,
};
use super::{ApiTags, AppState, BearerAuth};
use crate::services::{activity, comments, moderation, recommended};

pub struct AdminApi {
    pub state: Arc<AppState>,
}

#[OpenApi(prefix_path = "/admin", tag = "ApiTags::Admin")]
impl AdminApi {
    /// 승인 대기 글
    #[oai(path = "/posts/pending", method = "get")]
    async fn pending_posts(&self, auth: BearerAuth) -> poem::Result<Json<Vec<PostCard>>> {
        let user = self.state.current_user(&auth).await?;
        let rows = moderation::pending_posts(&self.state.db, &user).await?;
        Ok(Json(cards(&rows)))
    }

    /// 차단된 글
    #[oai(path = "/posts/banned", method = "get")]
    async fn banned_posts(&self, auth: BearerAuth) -> poem::Result<Json<Vec<PostCard>>> {
        let user = self.state.current_user(&auth).await?;
        let rows = moderation::banned_posts(&self.state.db, &user).await?;
        Ok(Json(cards(&rows)))
    }

    #[oai(path = "/posts/:id/approve", method = "post")]
    async fn approve_post(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<PostCard>> {
        let user = self.state.current_user(&auth).await?;
        let post = moderation::approve_post(&self.state.db, &self.state.hub, &user, id).await?;
        Ok(Json(PostCard::from(&post)))
    }

    #[oai(path = "/posts/:id/ban", method = "post")]
    async fn ban_post(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<PostCard>> {
        let user = self.state.current_user(&auth).await?;
        let post = moderation::ban_post(&self.state.db, &self.state.hub, &user, id).await?;
        Ok(Json(PostCard::from(&post)))
    }

    #[oai(path = "/posts/:id/unban", method = "post")]
    async fn unban_post(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<PostCard>> {
        let user = self.state.current_user(&auth).await?;
        let post = moderation::unban_post(&self.state.db, &self.state.hub, &user, id).await?;
        Ok(Json(PostCard::from(&post)))
    }

    /// 승인 대기 댓글
    #[oai(path = "/comments/pending", method = "get")]
    async fn pending_comments(&self, auth: BearerAuth) -> poem::Result<Json<Vec<CommentView>>> {
        let user = self.state.current_user(&auth).await?;
        let rows = comments::pending_comments(&self.state.db, &user).await?;
        Ok(Json(rows.iter().map(CommentView::from).collect()))
    }

    #[oai(path = "/comments/:id/approve", method = "post")]
    async fn approve_comment(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        comments::approve_comment(&self.state.db, &self.state.hub, &user, id).await?;
        Ok(Json(StatusResponse::success("Comment approved")))
    }

    #[oai(path = "/users/:id/block", method = "post")]
    async fn block_user(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<UserView>> {
        let user = self.state.current_user(&auth).await?;
        let updated = moderation::block_user(&self.state.db, &user, id).await?;
        Ok(Json(UserView::from(&updated)))
    }

    #[oai(path = "/users/:id/unblock", method = "post")]
    async fn unblock_user(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<UserView>> {
        let user = self.state.current_user(&auth).await?;
        let updated = moderation::unblock_user(&self.state.db, &user, id).await?;
        Ok(Json(UserView::from(&updated)))
    }

    #[oai(path = "/users/:id/role", method = "post")]
    async fn set_role(&self, auth: BearerAuth, Path(id): Path<i32>, Json(input): Json<RoleRequest>) -> poem::Result<Json<UserView>> {
        let user = self.state.current_user(&auth).await?;
        let updated = moderation::set_role(&self.state.db, &user, id, input.role.into()).await?;
        Ok(Json(UserView::from(&updated)))
    }

    /// 추천 친구 재계산 + 읽은 팔로우 활동 정리
    #[oai(path = "/maintenance/recommended", method = "post")]
    async fn run_maintenance(&self, auth: BearerAuth) -> poem::Result<Json<RebuildView>> {
        let user = self.state.current_user(&auth).await?;
        user.require_admin()?;
        let written = recommended::rebuild(&self.state.db).await?;
        activity::delete_read_follow_actions(&self.state.db).await?;
        Ok(Json(RebuildView { written: written as u64 }))
    }
}
