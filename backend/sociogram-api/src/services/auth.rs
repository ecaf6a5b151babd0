/// Account lifecycle: signup, login, profile and device token
use std::sync::Arc;

use crypto_core::JwtKeys;
use uuid::Uuid;

use crate::db::{UserRepository, DUPLICATE_USER_MESSAGE};
use crate::error::{AppError, Result};
use crate::models::{
    Account, AuthResponse, NewUser, PageRequest, ProfileChanges, SignupRequest, User, UserProfile,
};
use crate::security::{hash_password, verify_dummy_password, verify_password};

/// Same message for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtKeys) -> Self {
        Self { users, jwt }
    }

    /// Register a user and open a session. The request is expected to be
    /// validated already.
    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse> {
        let username = req.username.trim().to_lowercase();
        let email = req.email.trim().to_lowercase();

        if self.users.find_by_email(&email).await?.is_some()
            || self.users.find_by_username(&username).await?.is_some()
        {
            return Err(AppError::Conflict(DUPLICATE_USER_MESSAGE.to_string()));
        }

        let password_hash = hash_password(&req.password)?;

        // The unique indexes still decide a race between two signups.
        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash,
                full_name: req.full_name.trim().to_string(),
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");

        self.session_for(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_dummy_password(password);
            tracing::debug!("login rejected: unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!(user_id = %user.id, "user logged in");
        self.session_for(&user)
    }

    fn session_for(&self, user: &User) -> Result<AuthResponse> {
        let token = self.jwt.issue(user.id, &user.email)?;
        Ok(AuthResponse {
            user: user.account(),
            token,
        })
    }

    pub async fn account(&self, user_id: Uuid) -> Result<Account> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| u.account())
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> Result<Account> {
        let changes = ProfileChanges {
            full_name: changes.full_name.map(|n| n.trim().to_string()),
            bio: changes.bio.map(|b| b.trim().to_string()),
            profile_image: changes.profile_image.map(|p| p.trim().to_string()),
        };

        self.users
            .update_profile(user_id, changes)
            .await?
            .map(|u| u.account())
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn set_device_token(&self, user_id: Uuid, device_token: &str) -> Result<Account> {
        let user = self
            .users
            .set_device_token(user_id, device_token.trim())
            .await?
            .ok_or(AppError::NotFound("User"))?;

        tracing::info!(user_id = %user.id, "device token registered");
        Ok(user.account())
    }

    pub async fn public_profile(&self, username: &str) -> Result<UserProfile> {
        self.users
            .find_by_username(&username.trim().to_lowercase())
            .await?
            .map(|u| u.profile())
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn search(&self, query: &str, page: PageRequest) -> Result<(Vec<UserProfile>, u64)> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Search query is required".to_string()));
        }

        let (users, total) = self.users.search(query, page).await?;
        Ok((users.iter().map(User::profile).collect(), total))
    }
}
