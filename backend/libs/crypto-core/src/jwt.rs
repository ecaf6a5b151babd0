/// Session token issuance and validation
///
/// Tokens are HS256-signed JWTs carrying the user id (`sub`) and email, with a
/// fixed lifetime chosen at startup. Every failure mode on the validation path
/// (bad signature, malformed token, expired token) collapses into
/// [`TokenError::Invalid`] so callers can reject uniformly.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::JwtKeys;
/// use uuid::Uuid;
///
/// let keys = JwtKeys::from_secret("a-long-random-secret-for-signing-tokens", 168).unwrap();
/// let user_id = Uuid::new_v4();
/// let token = keys.issue(user_id, "jane@example.com").unwrap();
/// assert_eq!(keys.user_id(&token).unwrap(), user_id);
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Default token lifetime: seven days.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims embedded in every session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Email address at the time of issuance
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("Token lifetime must be positive")]
    InvalidLifetime,

    #[error("Failed to generate token: {0}")]
    Encode(String),

    #[error("Invalid or expired token")]
    Invalid,
}

// ============================================================================
// Key Storage
// ============================================================================

/// Signing and verification keys plus the fixed token lifetime.
///
/// Cheap to clone; services keep one instance in application state.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &JWT_ALGORITHM)
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    /// Build keys from a shared HMAC secret.
    pub fn from_secret(secret: &str, ttl_hours: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if ttl_hours <= 0 {
            return Err(TokenError::InvalidLifetime);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        })
    }

    /// Token lifetime in seconds, as reported to clients.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    // ========================================================================
    // Token Generation
    // ========================================================================

    /// Issue a session token for `user_id` valid from now.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issue a session token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    // ========================================================================
    // Token Validation
    // ========================================================================

    /// Verify signature and expiry, returning the decoded claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verify the token and extract the user id from `sub`.
    pub fn user_id(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.validate(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-that-is-long-enough-for-hs256";

    #[test]
    fn test_issue_and_validate() {
        let keys = JwtKeys::from_secret(SECRET, DEFAULT_TOKEN_TTL_HOURS).unwrap();
        let user_id = Uuid::new_v4();

        let token = keys.issue(user_id, "jane@example.com").unwrap();
        let claims = keys.validate(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.exp - claims.iat, keys.ttl_seconds());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(
            JwtKeys::from_secret("", 1).unwrap_err(),
            TokenError::EmptySecret
        );
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        assert_eq!(
            JwtKeys::from_secret(SECRET, 0).unwrap_err(),
            TokenError::InvalidLifetime
        );
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let keys = JwtKeys::from_secret(SECRET, 1).unwrap();
        assert_eq!(keys.validate("not.a.jwt").unwrap_err(), TokenError::Invalid);
    }
}
