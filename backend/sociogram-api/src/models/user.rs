/// User model and its outward-facing projections
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored user record.
///
/// Deliberately not `Serialize`: the only way to put a user on the wire is
/// through one of the projections below, none of which carries the hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user. Username and email are already
/// normalized (trimmed, lowercased) and the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

/// Partial profile update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.bio.is_none() && self.profile_image.is_none()
    }
}

impl User {
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            profile_image: self.profile_image.clone(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            profile_image: self.profile_image.clone(),
            created_at: self.created_at,
        }
    }

    pub fn account(&self) -> Account {
        Account {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            profile_image: self.profile_image.clone(),
            device_token: self.device_token.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public author reference embedded in posts and comments
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl AuthorSummary {
    /// Placeholder for a reference whose user record is missing.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            username: "unknown".to_string(),
            full_name: "Unknown user".to_string(),
            profile_image: None,
        }
    }
}

/// Public profile returned by lookups and search
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The caller's own account
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "jane_dev".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            full_name: "Jane Doe".to_string(),
            bio: None,
            profile_image: None,
            device_token: Some("device-token-abcdef".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_projections_never_carry_password_hash() {
        let user = user();
        for json in [
            serde_json::to_string(&user.summary()).unwrap(),
            serde_json::to_string(&user.profile()).unwrap(),
            serde_json::to_string(&user.account()).unwrap(),
        ] {
            assert!(!json.contains("argon2"));
            assert!(!json.to_lowercase().contains("password"));
        }
    }

    #[test]
    fn test_summary_wire_names() {
        let json = serde_json::to_value(user().summary()).unwrap();
        assert!(json.get("_id").is_some());
        assert_eq!(json["fullName"], "Jane Doe");
        assert!(json.get("profileImage").is_none());
    }

    #[test]
    fn test_profile_hides_email_and_device_token() {
        let json = serde_json::to_string(&user().profile()).unwrap();
        assert!(!json.contains("jane@example.com"));
        assert!(!json.contains("device-token"));
    }
}
