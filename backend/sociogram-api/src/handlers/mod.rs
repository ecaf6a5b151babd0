/// HTTP handlers
///
/// - `auth`: signup, login, profile, device token, user lookup and search
/// - `posts`: post CRUD, like toggle and comments
/// - `health`: liveness probe
pub mod auth;
pub mod health;
pub mod posts;

use actix_web::HttpResponse;

use crate::response::ApiResponse;

pub use auth::{get_profile, get_user, login, search_users, signup, update_device_token, update_profile};
pub use health::health;
pub use posts::{
    add_comment, create_post, delete_comment, delete_post, get_feed, get_post, toggle_like,
    update_post,
};

/// Fallback for unmatched routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::failure("Route not found"))
}
