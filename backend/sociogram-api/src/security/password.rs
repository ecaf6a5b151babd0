/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use lazy_static::lazy_static;
use validator::ValidationError;

use crate::error::{AppError, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password using Argon2id.
/// Returns the PHC string stored in the `password_hash` column.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(rand::thread_rng());

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash.
///
/// `Ok(false)` means the password is wrong; an unreadable hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash format".to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

lazy_static! {
    /// Hash with the same parameters as real accounts, verified when the
    /// email is unknown so both login failures cost one Argon2 run.
    static ref DUMMY_PASSWORD_HASH: String =
        hash_password("dummy-password-for-unknown-accounts").unwrap_or_default();
}

/// Run a full verification that can never succeed.
pub fn verify_dummy_password(password: &str) {
    if let Ok(true) = verify_password(password, &DUMMY_PASSWORD_HASH) {
        tracing::warn!("dummy password hash matched a login attempt");
    }
}

/// Password strength rules for signup:
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
pub fn validate_password_strength(password: &str) -> std::result::Result<(), ValidationError> {
    let rule = |code: &'static str, message: &'static str| {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        err
    };

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(rule(
            "password_too_short",
            "Password must be at least 8 characters",
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(rule(
            "password_no_uppercase",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(rule(
            "password_no_lowercase",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(rule(
            "password_no_digit",
            "Password must contain at least one number",
        ));
    }

    Ok(())
}
