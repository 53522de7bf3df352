use std::sync::Arc;

use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::Json,
};

use super::views::{CountView, NotificationView, StatusResponse};
use super::{ApiTags, AppState, BearerAuth};
use crate::entities::NotificationStatus;
use crate::services::{Page, notifications};

pub struct NotificationApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Notifications")]
impl NotificationApi {
    /// 알림 목록
    #[oai(path = "/notifications", method = "get")]
    async fn list(
        &self,
        auth: BearerAuth,
        Query(page): Query<Option<u64>>,
        Query(per_page): Query<Option<u64>>,
    ) -> poem::Result<Json<Vec<NotificationView>>> {
        let user = self.state.current_user(&auth).await?;
        let rows = notifications::list(&self.state.db, &user, Page::new(page, per_page)).await?;
        Ok(Json(rows.iter().map(NotificationView::from).collect()))
    }

    /// 읽지 않은 알림 수
    #[oai(path = "/notifications/count", method = "get")]
    async fn count(&self, auth: BearerAuth) -> poem::Result<Json<CountView>> {
        let user = self.state.current_user(&auth).await?;
        let count = notifications::unread_count(&self.state.db, user.id).await?;
        Ok(Json(CountView { count }))
    }

    #[oai(path = "/notifications/:id/read", method = "post")]
    async fn mark_read(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<NotificationView>> {
        let user = self.state.current_user(&auth).await?;
        let updated = notifications::set_status(&self.state.db, &user, id, NotificationStatus::Read).await?;
        Ok(Json(NotificationView::from(&updated)))
    }

    #[oai(path = "/notifications/:id/pin", method = "post")]
    async fn pin(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<NotificationView>> {
        let user = self.state.current_user(&auth).await?;
        let updated = notifications::set_status(&self.state.db, &user, id, NotificationStatus::Pinned).await?;
        Ok(Json(NotificationView::from(&updated)))
    }

    #[oai(path = "/notifications/read", method = "post")]
    async fn mark_all_read(&self, auth: BearerAuth) -> poem::Result<Json<CountView>> {
        let user = self.state.current_user(&auth).await?;
        let count = notifications::mark_all_read(&self.state.db, &user).await?;
        Ok(Json(CountView { count }))
    }

    #[oai(path = "/notifications/:id", method = "delete")]
    async fn delete(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        notifications::delete(&self.state.db, &user, id).await?;
        Ok(Json(StatusResponse::success("Notification deleted")))
    }
}
