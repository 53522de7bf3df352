use std::sync::Arc;

use poem::Request;
use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::Json,
};

use super::views::{
    CategoryRequest, CommentRequest, CommentView, EditPostView, LikeView, PostCard,
    PostDetailsView, PostRequest, StatusResponse, TagRequest, cards,
};
use super::{ApiTags, AppState, BearerAuth};
use crate::services::comments::{self, CommentInput};
use crate::services::posts::CommentEntry;
use crate::services::{Page, blog, posts};

fn post_input(input: PostRequest) -> blog::PostInput {
    blog::PostInput {
        title: input.title,
        content: input.content,
        category_name: input.category_name,
        tag_names: input.tag_names,
        image_url: input.image_url,
    }
}

pub struct PostApi {
    pub state: Arc<AppState>,
}

#[OpenApi]
impl PostApi {
    /// 목록 (페이지네이션, 검색)
    #[oai(path = "/posts", method = "get", tag = "ApiTags::Posts")]
    async fn list_posts(
        &self,
        req: &Request,
        Query(page): Query<Option<u64>>,
        Query(per_page): Query<Option<u64>>,
        Query(search): Query<Option<String>>,
    ) -> poem::Result<Json<Vec<PostCard>>> {
        let viewer = self.state.viewer(req).await?;
        let rows = blog::list_posts(
            &self.state.db,
            viewer.as_ref(),
            search.as_deref(),
            Page::new(page, per_page),
        )
        .await?;
        Ok(Json(cards(&rows)))
    }

    /// 단건 조회
    #[oai(path = "/posts/:id", method = "get", tag = "ApiTags::Posts")]
    async fn get_post(&self, req: &Request, Path(id): Path<i32>) -> poem::Result<Json<PostDetailsView>> {
        let viewer = self.state.viewer(req).await?;
        let details = posts::post_details(&self.state.db, viewer.as_ref(), id).await?;
        Ok(Json(PostDetailsView::from(&details)))
    }

    /// 생성
    #[oai(path = "/posts", method = "post", tag = "ApiTags::Posts")]
    async fn create_post(&self, auth: BearerAuth, Json(input): Json<PostRequest>) -> poem::Result<Json<PostCard>> {
        let user = self.state.current_user(&auth).await?;
        let created = blog::create_post(&self.state.db, &self.state.hub, &user, post_input(input)).await?;
        Ok(Json(PostCard::from(&created)))
    }

    /// 수정 폼
    #[oai(path = "/posts/:id/edit", method = "get", tag = "ApiTags::Posts")]
    async fn edit_form(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<EditPostView>> {
        let user = self.state.current_user(&auth).await?;
        let editable = blog::post_for_edit(&self.state.db, &user, id).await?;
        Ok(Json(editable.into()))
    }

    /// 수정
    #[oai(path = "/posts/:id", method = "put", tag = "ApiTags::Posts")]
    async fn update_post(
        &self,
        auth: BearerAuth,
        Path(id): Path<i32>,
        Json(input): Json<PostRequest>,
    ) -> poem::Result<Json<PostCard>> {
        let user = self.state.current_user(&auth).await?;
        let updated = blog::edit_post(&self.state.db, &user, id, post_input(input)).await?;
        Ok(Json(PostCard::from(&updated)))
    }

    /// 삭제
    #[oai(path = "/posts/:id", method = "delete", tag = "ApiTags::Posts")]
    async fn delete_post(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        blog::delete_post(&self.state.db, &user, id).await?;
        Ok(Json(StatusResponse::success("Post deleted")))
    }

    /// 좋아요 (토글)
    #[oai(path = "/posts/:id/like", method = "post", tag = "ApiTags::Posts")]
    async fn like_post(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<LikeView>> {
        let user = self.state.current_user(&auth).await?;
        let state = posts::like_post(&self.state.db, &user, id).await?;
        Ok(Json(state.into()))
    }

    /// 좋아요 취소
    #[oai(path = "/posts/:id/unlike", method = "post", tag = "ApiTags::Posts")]
    async fn unlike_post(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<LikeView>> {
        let user = self.state.current_user(&auth).await?;
        let state = posts::unlike_post(&self.state.db, &user, id).await?;
        Ok(Json(state.into()))
    }

    /// 즐겨찾기 추가
    #[oai(path = "/posts/:id/favourite", method = "post", tag = "ApiTags::Posts")]
    async fn add_favourite(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        posts::add_to_favourite(&self.state.db, &self.state.hub, &user, id).await?;
        Ok(Json(StatusResponse::success("Post added to favourites")))
    }

    /// 즐겨찾기 삭제
    #[oai(path = "/posts/:id/favourite", method = "delete", tag = "ApiTags::Posts")]
    async fn remove_favourite(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        posts::remove_from_favourite(&self.state.db, &user, id).await?;
        Ok(Json(StatusResponse::success("Post removed from favourites")))
    }

    #[oai(path = "/categories", method = "get", tag = "ApiTags::Posts")]
    async fn categories(&self) -> poem::Result<Json<Vec<String>>> {
        Ok(Json(blog::category_names(&self.state.db).await?))
    }

    #[oai(path = "/categories", method = "post", tag = "ApiTags::Posts")]
    async fn create_category(&self, auth: BearerAuth, Json(input): Json<CategoryRequest>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        blog::create_category(&self.state.db, &user, &input.name, &input.description).await?;
        Ok(Json(StatusResponse::success("Category created")))
    }

    #[oai(path = "/tags", method = "get", tag = "ApiTags::Posts")]
    async fn tags(&self) -> poem::Result<Json<Vec<String>>> {
        Ok(Json(blog::tag_names(&self.state.db).await?))
    }

    #[oai(path = "/tags", method = "post", tag = "ApiTags::Posts")]
    async fn create_tag(&self, auth: BearerAuth, Json(input): Json<TagRequest>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        blog::create_tag(&self.state.db, &user, &input.name).await?;
        Ok(Json(StatusResponse::success("Tag created")))
    }

    /// 댓글 작성
    #[oai(path = "/posts/:id/comments", method = "post", tag = "ApiTags::Comments")]
    async fn create_comment(
        &self,
        auth: BearerAuth,
        Path(id): Path<i32>,
        Json(input): Json<CommentRequest>,
    ) -> poem::Result<Json<CommentView>> {
        let user = self.state.current_user(&auth).await?;
        let created = comments::create_comment(
            &self.state.db,
            &self.state.hub,
            &user,
            id,
            CommentInput {
                content: input.content,
                parent_id: input.parent_id,
            },
        )
        .await?;
        let entry = CommentEntry {
            comment: created,
            author: None,
        };
        Ok(Json(CommentView::from(&entry)))
    }

    /// 댓글 삭제
    #[oai(path = "/comments/:id", method = "delete", tag = "ApiTags::Comments")]
    async fn delete_comment(&self, auth: BearerAuth, Path(id): Path<i32>) -> poem::Result<Json<StatusResponse>> {
        let user = self.state.current_user(&auth).await?;
        comments::delete_comment(&self.state.db, &user, id).await?;
        Ok(Json(StatusResponse::success("Comment deleted")))
    }
}
