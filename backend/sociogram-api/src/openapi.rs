/// OpenAPI documentation for the Sociogram API
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models::{
    Account, AuthResponse, AuthorSummary, CommentRequest, CommentView, CreatePostRequest,
    DeviceTokenRequest, LoginRequest, PostView, SignupRequest, UpdateProfileRequest, UserProfile,
};
use crate::response::Pagination;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sociogram API",
        version = "0.1.0",
        description = "Social feed backend: accounts, posts, likes, comments and push notifications.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Development server"),
    ),
    paths(
        handlers::health::health,
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::get_profile,
        handlers::auth::update_profile,
        handlers::auth::update_device_token,
        handlers::auth::get_user,
        handlers::auth::search_users,
        handlers::posts::create_post,
        handlers::posts::get_feed,
        handlers::posts::get_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::posts::toggle_like,
        handlers::posts::add_comment,
        handlers::posts::delete_comment,
    ),
    components(schemas(
        SignupRequest,
        LoginRequest,
        AuthResponse,
        Account,
        UserProfile,
        AuthorSummary,
        UpdateProfileRequest,
        DeviceTokenRequest,
        CreatePostRequest,
        CommentRequest,
        PostView,
        CommentView,
        Pagination,
        handlers::health::HealthStatus,
    )),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "auth", description = "Accounts, sessions and profiles"),
        (name = "posts", description = "Posts, feed and likes"),
        (name = "comments", description = "Comments on posts"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from /api/auth/login or /api/auth/signup"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/openapi.json"
    }
}
