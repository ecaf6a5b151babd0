//! Shared fixtures for sociogram-api integration tests.
//!
//! Every test builds its own in-memory store, so tests never share state.
//! Push notifications go to a recording notifier and are read back from an
//! mpsc channel.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use async_trait::async_trait;
use crypto_core::JwtKeys;
use serde_json::{json, Value};
use sociogram_api::db::MemoryStore;
use sociogram_api::services::{PushError, PushMessage, PushNotifier};
use sociogram_api::AppState;
use tokio::sync::mpsc;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "SecurePass123";

/// Records every notification instead of delivering it
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<(String, PushMessage)>,
}

#[async_trait]
impl PushNotifier for RecordingNotifier {
    async fn send(&self, device_token: &str, message: &PushMessage) -> Result<(), PushError> {
        let _ = self.tx.send((device_token.to_string(), message.clone()));
        Ok(())
    }
}

/// Records the attempt, then fails it the way an unreachable push provider would
pub struct FailingNotifier {
    tx: mpsc::UnboundedSender<(String, PushMessage)>,
}

#[async_trait]
impl PushNotifier for FailingNotifier {
    async fn send(&self, device_token: &str, message: &PushMessage) -> Result<(), PushError> {
        let _ = self.tx.send((device_token.to_string(), message.clone()));
        Err(PushError::Delivery("push provider unavailable".to_string()))
    }
}

pub struct TestContext {
    pub state: AppState,
    pub jwt: JwtKeys,
    pub store: MemoryStore,
    pushes: mpsc::UnboundedReceiver<(String, PushMessage)>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(|tx| Arc::new(RecordingNotifier { tx }) as Arc<dyn PushNotifier>)
    }

    /// Every push delivery fails; attempts still show up in `next_push`.
    pub fn with_failing_notifier() -> Self {
        Self::build(|tx| Arc::new(FailingNotifier { tx }) as Arc<dyn PushNotifier>)
    }

    fn build(
        notifier: impl FnOnce(mpsc::UnboundedSender<(String, PushMessage)>) -> Arc<dyn PushNotifier>,
    ) -> Self {
        let store = MemoryStore::new();
        let jwt = JwtKeys::from_secret(TEST_SECRET, 1).expect("jwt keys");
        let (tx, pushes) = mpsc::unbounded_channel();

        let state = AppState::new(store.users(), store.posts(), notifier(tx), jwt.clone());

        Self {
            state,
            jwt,
            store,
            pushes,
        }
    }

    /// Wait briefly for the next dispatched notification.
    pub async fn next_push(&mut self) -> Option<(String, PushMessage)> {
        tokio::time::timeout(Duration::from_secs(2), self.pushes.recv())
            .await
            .ok()
            .flatten()
    }

    /// Give spawned dispatches a chance to run, then assert none arrived.
    pub async fn assert_no_push(&mut self) {
        let pushed = tokio::time::timeout(Duration::from_millis(200), self.pushes.recv()).await;
        assert!(
            !matches!(pushed, Ok(Some(_))),
            "unexpected push notification: {:?}",
            pushed
        );
    }
}

/// A signed-up user as seen by the client
pub struct TestUser {
    pub id: String,
    pub token: String,
    pub username: String,
    pub email: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

/// Send a request and decode the JSON envelope.
pub async fn send<S, B>(app: &S, req: TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

pub async fn signup<S, B>(app: &S, username: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let email = format!("{}@example.com", username);
    let (status, body) = send(
        app,
        TestRequest::post().uri("/api/auth/signup").set_json(json!({
            "username": username,
            "email": email,
            "password": PASSWORD,
            "fullName": format!("{} Tester", username),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

    TestUser {
        id: body["data"]["user"]["_id"].as_str().expect("user id").to_string(),
        token: body["data"]["token"].as_str().expect("token").to_string(),
        username: username.to_string(),
        email,
    }
}

pub async fn register_device<S, B>(app: &S, user: &TestUser, device_token: &str)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        TestRequest::put()
            .uri("/api/auth/device-token")
            .insert_header(user.bearer())
            .set_json(json!({ "deviceToken": device_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "device token failed: {}", body);
}

/// Create a post and return its id.
pub async fn create_post<S, B>(app: &S, user: &TestUser, content: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        TestRequest::post()
            .uri("/api/posts")
            .insert_header(user.bearer())
            .set_json(json!({ "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {}", body);
    body["data"]["_id"].as_str().expect("post id").to_string()
}

pub async fn like<S, B>(app: &S, user: &TestUser, post_id: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(
        app,
        TestRequest::post()
            .uri(&format!("/api/posts/{}/like", post_id))
            .insert_header(user.bearer()),
    )
    .await
}

pub async fn comment<S, B>(
    app: &S,
    user: &TestUser,
    post_id: &str,
    content: &str,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(
        app,
        TestRequest::post()
            .uri(&format!("/api/posts/{}/comment", post_id))
            .insert_header(user.bearer())
            .set_json(json!({ "content": content })),
    )
    .await
}
