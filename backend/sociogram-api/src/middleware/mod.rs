/// Request authentication and authorization helpers
///
/// Routes that need a caller take a [`UserId`] argument. The extractor reads
/// the `Authorization: Bearer <jwt>` header, validates it against the
/// [`JwtKeys`] registered as app data and rejects the request with 401
/// otherwise. Public routes simply don't ask for it.
pub mod permissions;

pub use permissions::*;

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpMessage, HttpRequest};
use crypto_core::JwtKeys;
use uuid::Uuid;

use crate::error::AppError;

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

fn authenticate(req: &HttpRequest) -> Result<UserId, AppError> {
    // Already resolved earlier in this request
    if let Some(user_id) = req.extensions().get::<UserId>() {
        return Ok(*user_id);
    }

    let keys = req
        .app_data::<web::Data<JwtKeys>>()
        .ok_or_else(|| AppError::Internal("JWT keys not registered".to_string()))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".to_string()))?;

    let user_id = UserId(keys.user_id(token)?);
    req.extensions_mut().insert(user_id);
    Ok(user_id)
}

impl FromRequest for UserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(SECRET, 1).unwrap()
    }

    #[actix_web::test]
    async fn test_valid_bearer_token() {
        let keys = keys();
        let user = Uuid::new_v4();
        let token = keys.issue(user, "jane@example.com").unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(keys))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request();

        assert_eq!(authenticate(&req).unwrap(), UserId(user));
    }

    #[actix_web::test]
    async fn test_missing_header_rejected() {
        let req = TestRequest::default()
            .app_data(web::Data::new(keys()))
            .to_http_request();
        assert!(matches!(authenticate(&req), Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_wrong_scheme_rejected() {
        let req = TestRequest::default()
            .app_data(web::Data::new(keys()))
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(matches!(authenticate(&req), Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_token_from_other_secret_rejected() {
        let other = JwtKeys::from_secret("another-secret-that-is-also-long-enough", 1).unwrap();
        let token = other.issue(Uuid::new_v4(), "jane@example.com").unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(keys()))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request();
        assert!(matches!(authenticate(&req), Err(AppError::Unauthorized(_))));
    }
}
