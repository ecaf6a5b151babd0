/// Authentication and profile handlers
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{
    Account, AuthResponse, DeviceTokenRequest, LoginRequest, PageRequest, ProfileChanges,
    SearchQuery, SignupRequest, UpdateProfileRequest, UserProfile,
};
use crate::response::{created, ok, PaginatedResponse, Pagination};
use crate::AppState;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username already taken")
    )
)]
pub async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let req = payload.into_inner();
    req.validate()?;

    let session = state.auth.signup(req).await?;
    Ok(created(session, "User created successfully"))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ok(session, "Login successful"))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "auth",
    responses(
        (status = 200, description = "Caller's account", body = Account),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let account = state.auth.account(user_id.0).await?;
    Ok(ok(account, "Profile retrieved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = Account),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let req = payload.into_inner();
    let changes = ProfileChanges {
        full_name: req.full_name,
        bio: req.bio,
        profile_image: req.profile_image,
    };
    if changes.is_empty() {
        return Err(AppError::Validation("No profile fields to update".to_string()));
    }

    let account = state.auth.update_profile(user_id.0, changes).await?;
    Ok(ok(account, "Profile updated successfully"))
}

#[utoipa::path(
    put,
    path = "/api/auth/device-token",
    tag = "auth",
    request_body = DeviceTokenRequest,
    responses(
        (status = 200, description = "Token stored", body = Account),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_device_token(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<DeviceTokenRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let account = state
        .auth
        .set_device_token(user_id.0, &payload.device_token)
        .await?;
    Ok(ok(account, "Device token updated successfully"))
}

#[utoipa::path(
    get,
    path = "/api/auth/users/{username}",
    tag = "auth",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Public profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = state.auth.public_profile(&username).await?;
    Ok(ok(profile, "User profile retrieved successfully"))
}

#[utoipa::path(
    get,
    path = "/api/auth/search",
    tag = "auth",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching users"),
        (status = 400, description = "Missing query")
    )
)]
pub async fn search_users(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::resolve(query.page, query.limit);
    let (users, total) = state.auth.search(&query.query, page).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::new(
        users,
        Pagination::new(page.page, page.limit, total),
        "Users found",
    )))
}
