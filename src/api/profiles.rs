use std::sync::Arc;

use poem::Request;
use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::Json,
};

use super::views::{
    ActivityView, CountView, PostCard, ProfileRequest, ProfileView, RecommendedView,
    StatusResponse, UserView, cards,
};
use super::{ApiTags, AppState, BearerAuth};
use crate::services::profiles::{self, ProfileInput};
use crate::services::{Page, activity, find_user_by_name, follows, posts, recommended};

pub struct ProfileApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Profiles")]
impl ProfileApi {
    /// 프로필 조회
    #[oai(path = "/profiles/:username", method = "get")]
    async fn profile(&self, req: &Request, Path(username): Path<String>) -> poem::Result<Json<ProfileView>> {
        let viewer = self.state.viewer(req).await?;
        let summary = profiles::profile(&self.state.db, &username, viewer.as_ref()).await?;
        Ok(Json(ProfileView::from(&summary)))
    }

    /// 프로필 수정
    #[oai(path = "/profile", method = "put")]
    async fn update_profile(&self, auth: BearerAuth, Json(input): Json<ProfileRequest>) -> poem::Result<Json<UserView>> {
        let user = self.state.current_user(&auth).await?;
        let updated = profiles::update_profile(
            &self.state.db,
            &user,
            ProfileInput {
                first_name: input.first_name,
                last_name: input.last_name,
                state: input.state,
                image_url: input.image_url,
                cover_image_url: input.cover_image_url,
            },
        )
        .await?;
        Ok(Json(UserView::from(&updated)))
    }

    #[oai(path = "/profiles/:username/posts", method = "get")]
    async fn user_posts(
        &self,
        req: &Request,
        Path(username): Path<String>,
        Query(page): Query<Option<u64>>,
        Query(per_page): Query<Option<u64>>,
    ) -> poem::Result<Json<Vec<PostCard>>> {
        let viewer = self.state.viewer(req).await?;
        let rows = profiles::user_posts(&self.state.db, &username, viewer.as_ref(), Page::new(page, per_page)).await?;
        Ok(Json(cards(&rows)))
    }

    #[oai(path = "/profiles/:username/followers", method = "get")]
    async fn followers(&self, Path(username): Path<String>) -> poem::Result<Json<Vec<UserView>>> {
        let owner = find_user_by_name(&self.state.db, &username).await?;
        let users = follows::followers(&self.state.db, owner.id).await?;
        Ok(Json(users.iter().map(UserView::from).collect()))
    }

    #[oai(path = "/profiles/:username/followings", method = "get")]
    async fn followings(&self, Path(username): Path<String>) -> poem::Result<Json<Vec<UserView>>> {
        let owner = find_user_by_name(&self.state.db, &username).await?;
        let users = follows::followings(&self.state.db, owner.id).await?;
        Ok(Json(users.iter().map(UserView::from).collect()))
    }

    /// 팔로우
    #[oai(path = "/profiles/:username/follow", method = "post")]
    async fn follow(&self, auth: BearerAuth, Path(username): Path<String>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        follows::follow(&self.state.db, &self.state.hub, &user, &username).await?;
        Ok(Json(StatusResponse::success("Followed")))
    }

    /// 언팔로우
    #[oai(path = "/profiles/:username/unfollow", method = "post")]
    async fn unfollow(&self, auth: BearerAuth, Path(username): Path<String>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        follows::unfollow(&self.state.db, &user, &username).await?;
        Ok(Json(StatusResponse::success("Unfollowed")))
    }

    #[oai(path = "/profile/favourites", method = "get")]
    async fn favourites(&self, auth: BearerAuth) -> poem::Result<Json<Vec<PostCard>>> {
        let user = self.state.current_user(&auth).await?;
        let rows = posts::favourite_posts(&self.state.db, &user).await?;
        Ok(Json(cards(&rows)))
    }

    #[oai(path = "/profile/activities", method = "get")]
    async fn activities(
        &self,
        auth: BearerAuth,
        Query(page): Query<Option<u64>>,
        Query(per_page): Query<Option<u64>>,
    ) -> poem::Result<Json<Vec<ActivityView>>> {
        let user = self.state.current_user(&auth).await?;
        let rows = activity::activities(&self.state.db, user.id, Page::new(page, per_page)).await?;
        Ok(Json(rows.iter().map(ActivityView::from).collect()))
    }

    #[oai(path = "/profile/activities/read", method = "post")]
    async fn read_activities(&self, auth: BearerAuth) -> poem::Result<Json<CountView>> {
        let user = self.state.current_user(&auth).await?;
        let count = activity::mark_read(&self.state.db, user.id).await?;
        Ok(Json(CountView { count }))
    }

    /// 추천 친구
    #[oai(path = "/profile/recommended", method = "get")]
    async fn recommended(&self, auth: BearerAuth, Query(search): Query<Option<String>>) -> poem::Result<Json<Vec<RecommendedView>>> {
        let user = self.state.current_user(&auth).await?;
        let rows = recommended::recommended_users(&self.state.db, &user, search.as_deref()).await?;
        Ok(Json(rows.iter().map(RecommendedView::from).collect()))
    }
}
