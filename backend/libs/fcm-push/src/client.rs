use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::FcmError;
use crate::models::*;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Firebase Cloud Messaging Client
///
/// Sends notifications to individual devices. OAuth2 access tokens are
/// minted from the service account and cached until one minute before expiry.
pub struct FcmClient {
    pub project_id: String,
    credentials: Arc<ServiceAccountKey>,
    token_cache: Arc<Mutex<Option<TokenCache>>>,
    http_client: reqwest::Client,
}

impl FcmClient {
    /// Create new FCM client
    ///
    /// # Arguments
    /// * `project_id` - Firebase project ID
    /// * `credentials` - Service account key with OAuth2 credentials
    pub fn new(project_id: String, credentials: ServiceAccountKey) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            project_id,
            credentials: Arc::new(credentials),
            token_cache: Arc::new(Mutex::new(None)),
            http_client,
        }
    }

    /// Load the service account JSON from disk and build a client.
    pub fn from_service_account_file(
        project_id: String,
        path: impl AsRef<Path>,
    ) -> Result<Self, FcmError> {
        let raw = std::fs::read_to_string(path)?;
        let credentials: ServiceAccountKey = serde_json::from_str(&raw)?;
        Ok(Self::new(project_id, credentials))
    }

    /// Send notification via FCM to a single device
    pub async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<FcmSendResult, FcmError> {
        if !Self::validate_token(device_token) {
            return Err(FcmError::InvalidToken);
        }

        let access_token = self.get_access_token().await?;

        let message = FcmMessage {
            message: FcmMessageContent {
                token: device_token.to_string(),
                notification: FcmNotification {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data: data.clone(),
            },
        };

        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.project_id
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&access_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| FcmError::SendRequestError(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let fcm_response: FcmApiResponse = response
                    .json()
                    .await
                    .map_err(|e| FcmError::ResponseParseError(e.to_string()))?;

                Ok(FcmSendResult {
                    message_id: fcm_response
                        .name
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    success: true,
                })
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                Err(FcmError::ApiError(status.to_string(), error_text))
            }
        }
    }

    /// Validate device token format
    pub fn validate_token(device_token: &str) -> bool {
        // FCM registration tokens are typically 100-200 characters
        !device_token.trim().is_empty() && device_token.len() >= 10 && device_token.len() <= 1000
    }

    /// Get access token from service account (with caching)
    pub async fn get_access_token(&self) -> Result<String, FcmError> {
        let mut cache = self.token_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Utc::now().timestamp() + 60 {
                return Ok(cached.access_token.clone());
            }
        }

        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FcmError::KeyParseError(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.credentials.private_key_id.clone());

        let assertion = encode(&header, &claims, &encoding_key)
            .map_err(|e| FcmError::JwtEncodeError(e.to_string()))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FcmError::TokenError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FcmError::TokenRequestFailed(response.status().to_string()));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FcmError::TokenParseError(e.to_string()))?;

        tracing::debug!(
            expires_in = token_response.expires_in,
            "refreshed FCM access token"
        );

        *cache = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at: Utc::now().timestamp() + token_response.expires_in,
        });

        Ok(token_response.access_token)
    }
}
