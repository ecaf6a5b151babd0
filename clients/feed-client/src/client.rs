//! HTTP client for the feed API
//!
//! Unwraps the `{success, message, data, error, timestamp}` envelope and keeps
//! the session token, attaching it as a bearer header to every request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::FeedBackend;
use crate::error::{ClientError, Result};
use crate::models::{
    Account, FeedQuery, NewPost, Page, Pagination, PostView, ProfileUpdate, Session, SignupRequest,
    UserProfile,
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PagedEnvelope<T> {
    data: Vec<T>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Failure {
    message: String,
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Restore a session saved from an earlier login.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn profile(&self) -> Result<Account> {
        let request = self.request(Method::GET, "/api/auth/profile").await;
        self.data(request).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Account> {
        let request = self
            .request(Method::PUT, "/api/auth/profile")
            .await
            .json(update);
        self.data(request).await
    }

    /// Public profile by username.
    pub async fn user(&self, username: &str) -> Result<UserProfile> {
        let path = format!("/api/auth/users/{}", username.trim());
        let request = self.request(Method::GET, &path).await;
        self.data(request).await
    }

    pub async fn search_users(&self, query: &str, page: u32) -> Result<Page<UserProfile>> {
        let page = page.max(1).to_string();
        let request = self
            .request(Method::GET, "/api/auth/search")
            .await
            .query(&[("query", query.trim()), ("page", page.as_str())]);
        self.page(request).await
    }

    pub async fn register_device(&self, device_token: &str) -> Result<Account> {
        let request = self
            .request(Method::PUT, "/api/auth/device-token")
            .await
            .json(&json!({ "deviceToken": device_token }));
        self.data(request).await
    }

    pub async fn update_post(&self, post_id: Uuid, post: &NewPost) -> Result<PostView> {
        let path = format!("/api/posts/{}", post_id);
        let request = self.request(Method::PUT, &path).await.json(post);
        self.data(request).await
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        let path = format!("/api/posts/{}", post_id);
        let request = self.request(Method::DELETE, &path).await;
        self.acknowledge(request).await
    }

    pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<PostView> {
        let path = format!("/api/posts/{}/comment/{}", post_id, comment_id);
        let request = self.request(Method::DELETE, &path).await;
        self.data(request).await
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "feed api request");
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send the request and return the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.clear_token().await;
        }

        let message = match serde_json::from_str::<Failure>(&body) {
            Ok(failure) => failure.error.unwrap_or(failure.message),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        warn!(status = status.as_u16(), %message, "feed api rejected request");
        Err(ClientError::api(status.as_u16(), message))
    }

    async fn envelope<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        let body = self.execute(request).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(ClientError::api(StatusCode::OK.as_u16(), envelope.message));
        }
        Ok(envelope)
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.envelope(request)
            .await?
            .data
            .ok_or(ClientError::MissingData)
    }

    async fn acknowledge(&self, request: RequestBuilder) -> Result<()> {
        self.envelope::<serde_json::Value>(request).await.map(|_| ())
    }

    async fn page<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Page<T>> {
        let body = self.execute(request).await?;
        let envelope: PagedEnvelope<T> = serde_json::from_str(&body)?;
        Ok(Page {
            items: envelope.data,
            pagination: envelope.pagination,
        })
    }

    async fn start_session(&self, request: RequestBuilder) -> Result<Session> {
        let session: Session = self.data(request).await?;
        self.set_token(session.token.clone()).await;
        Ok(session)
    }
}

#[async_trait]
impl FeedBackend for ApiClient {
    async fn signup(&self, request: &SignupRequest) -> Result<Session> {
        let request = self
            .request(Method::POST, "/api/auth/signup")
            .await
            .json(request);
        self.start_session(request).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .request(Method::POST, "/api/auth/login")
            .await
            .json(&json!({ "email": email, "password": password }));
        self.start_session(request).await
    }

    async fn feed(&self, query: &FeedQuery) -> Result<Page<PostView>> {
        let request = self.request(Method::GET, "/api/posts").await.query(query);
        self.page(request).await
    }

    async fn get_post(&self, post_id: Uuid) -> Result<PostView> {
        let path = format!("/api/posts/{}", post_id);
        let request = self.request(Method::GET, &path).await;
        self.data(request).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<PostView> {
        let request = self.request(Method::POST, "/api/posts").await.json(post);
        self.data(request).await
    }

    async fn toggle_like(&self, post_id: Uuid) -> Result<PostView> {
        let path = format!("/api/posts/{}/like", post_id);
        let request = self.request(Method::POST, &path).await;
        self.data(request).await
    }

    async fn add_comment(&self, post_id: Uuid, content: &str) -> Result<PostView> {
        let path = format!("/api/posts/{}/comment", post_id);
        let request = self
            .request(Method::POST, &path)
            .await
            .json(&json!({ "content": content }));
        self.data(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn account_json(id: Uuid) -> serde_json::Value {
        json!({
            "_id": id,
            "username": "jane_dev",
            "email": "jane@example.com",
            "fullName": "Jane Doe",
            "createdAt": "2024-05-01T09:00:00Z",
            "updatedAt": "2024-05-01T09:00:00Z"
        })
    }

    fn post_json(id: Uuid, author: Uuid) -> serde_json::Value {
        json!({
            "_id": id,
            "author": { "_id": author, "username": "jane_dev", "fullName": "Jane Doe" },
            "content": "hello",
            "tags": [],
            "likes": [],
            "comments": [],
            "likeCount": 0,
            "commentCount": 0,
            "createdAt": "2024-05-01T09:00:00Z",
            "updatedAt": "2024-05-01T09:00:00Z"
        })
    }

    fn envelope(data: serde_json::Value, message: &str) -> serde_json::Value {
        json!({
            "success": true,
            "message": message,
            "data": data,
            "timestamp": "2024-05-01T09:00:00Z"
        })
    }

    fn failure(message: &str) -> serde_json::Value {
        json!({
            "success": false,
            "message": message,
            "error": message,
            "timestamp": "2024-05-01T09:00:00Z"
        })
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_login_stores_token_for_later_requests() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        let post_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "email": "jane@example.com", "password": "SecurePass123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
                json!({ "user": account_json(user_id), "token": "session-token" }),
                "Login successful",
            )))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("/api/posts/{}/like", post_id)))
            .and(header("authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
                post_json(post_id, user_id),
                "Post liked successfully",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let session = client.login("jane@example.com", "SecurePass123").await.unwrap();
        assert_eq!(session.user.id, user_id);
        assert_eq!(client.token().await.as_deref(), Some("session-token"));

        let post = client.toggle_like(post_id).await.unwrap();
        assert_eq!(post.id, post_id);
    }

    #[tokio::test]
    async fn test_failure_envelope_becomes_api_error() {
        let server = MockServer::start().await;
        let post_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/api/posts/{}", post_id)))
            .respond_with(ResponseTemplate::new(404).set_body_json(failure("Post not found")))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.get_post(post_id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Post not found");
    }

    #[tokio::test]
    async fn test_unauthorized_response_clears_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/profile"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(failure("Invalid or expired token")),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_token("stale").await;

        let err = client.profile().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(client.token().await, None);
    }

    #[tokio::test]
    async fn test_non_json_error_uses_status_reason() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.feed(&FeedQuery::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_feed_sends_query_and_reads_pagination() {
        let server = MockServer::start().await;
        let author = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("page", "2"))
            .and(query_param("username", "jane_dev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Feeds retrieved successfully",
                "data": [post_json(Uuid::new_v4(), author)],
                "pagination": { "page": 2, "limit": 10, "total": 11, "totalPages": 2 },
                "timestamp": "2024-05-01T09:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let page = client
            .feed(&FeedQuery::page(2).by_user("jane_dev"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.total, 11);
        assert!(!page.pagination.has_next());
    }

    fn profile_json(id: Uuid, username: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "username": username,
            "fullName": "Jane Doe",
            "bio": "Rustacean",
            "createdAt": "2024-05-01T09:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_update_profile_sends_only_set_fields() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        let mut account = account_json(user_id);
        account["bio"] = json!("Rustacean");

        Mock::given(method("PUT"))
            .and(path("/api/auth/profile"))
            .and(header("authorization", "Bearer token"))
            .and(body_json(json!({ "bio": "Rustacean" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(account, "Profile updated successfully")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_token("token").await;
        let update = ProfileUpdate {
            bio: Some("Rustacean".to_string()),
            ..ProfileUpdate::default()
        };
        let account = client.update_profile(&update).await.unwrap();
        assert_eq!(account.bio.as_deref(), Some("Rustacean"));
    }

    #[tokio::test]
    async fn test_user_lookup_and_unknown_user() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/api/auth/users/jane_dev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
                profile_json(user_id, "jane_dev"),
                "User profile retrieved successfully",
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/auth/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(failure("User not found")))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let profile = client.user("jane_dev").await.unwrap();
        assert_eq!(profile.id, user_id);
        assert_eq!(profile.bio.as_deref(), Some("Rustacean"));

        let err = client.user("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_search_users_reads_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/search"))
            .and(query_param("query", "jan"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Users found",
                "data": [profile_json(Uuid::new_v4(), "jane_dev"), profile_json(Uuid::new_v4(), "janet")],
                "pagination": { "page": 1, "limit": 10, "total": 2, "totalPages": 1 },
                "timestamp": "2024-05-01T09:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let page = client.search_users(" jan ", 0).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].username, "janet");
        assert_eq!(page.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_delete_post_accepts_envelope_without_data() {
        let server = MockServer::start().await;
        let post_id = Uuid::new_v4();

        Mock::given(method("DELETE"))
            .and(path(format!("/api/posts/{}", post_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Post deleted successfully",
                "timestamp": "2024-05-01T09:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_token("token").await;
        client.delete_post(post_id).await.unwrap();
    }
}
