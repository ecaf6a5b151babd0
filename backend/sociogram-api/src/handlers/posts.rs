/// Post handlers - HTTP endpoints for the post aggregate
use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::middleware::UserId;
use crate::models::{
    normalize_tags, CommentRequest, CreatePostRequest, FeedQuery, LikeTransition, PageRequest,
    PostView,
};
use crate::response::{created, ok, ApiResponse, PaginatedResponse};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostView),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let req = payload.into_inner();
    let post = state
        .posts
        .create(user_id.0, &req.content, normalize_tags(req.tags))
        .await?;
    Ok(created(post, "Post created successfully"))
}

/// Paginated feed, newest first
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(FeedQuery),
    responses(
        (status = 200, description = "Page of posts"),
        (status = 404, description = "Unknown username filter")
    )
)]
pub async fn get_feed(
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::resolve(query.page, query.limit);
    let (posts, pagination) = state.posts.feed(query.username.as_deref(), page).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::new(
        posts,
        pagination,
        "Feeds retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = PostView),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(state: web::Data<AppState>, post_id: web::Path<Uuid>) -> Result<HttpResponse> {
    let post = state.posts.get(*post_id).await?;
    Ok(ok(post, "Post retrieved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Updated post", body = PostView),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let req = payload.into_inner();
    let post = state
        .posts
        .update(user_id.0, *post_id, &req.content, normalize_tags(req.tags))
        .await?;
    Ok(ok(post, "Post updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.delete(user_id.0, *post_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted successfully")))
}

/// Toggle the caller's like on a post
#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/like",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Updated post", body = PostView),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_like(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let (post, transition) = state.posts.toggle_like(user_id.0, *post_id).await?;

    let message = match transition {
        LikeTransition::Liked => "Post liked successfully",
        LikeTransition::Unliked => "Post unliked successfully",
    };
    Ok(ok(post, message))
}

#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/comment",
    tag = "comments",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Updated post", body = PostView),
        (status = 400, description = "Invalid comment"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let post = state
        .posts
        .add_comment(user_id.0, *post_id, &payload.content)
        .await?;
    Ok(ok(post, "Comment added successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{post_id}/comment/{comment_id}",
    tag = "comments",
    params(
        ("post_id" = Uuid, Path, description = "Post id"),
        ("comment_id" = Uuid, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Updated post", body = PostView),
        (status = 403, description = "Not the comment author"),
        (status = 404, description = "Post or comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post = state
        .posts
        .delete_comment(user_id.0, post_id, comment_id)
        .await?;
    Ok(ok(post, "Comment deleted successfully"))
}
