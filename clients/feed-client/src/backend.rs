use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{FeedQuery, NewPost, Page, PostView, Session, SignupRequest};

/// Operations the feed screen needs from a server.
///
/// Implemented by [`crate::ApiClient`] for the real API and by
/// [`crate::DemoBackend`] for offline use.
#[async_trait]
pub trait FeedBackend: Send + Sync {
    async fn signup(&self, request: &SignupRequest) -> Result<Session>;

    async fn login(&self, email: &str, password: &str) -> Result<Session>;

    async fn feed(&self, query: &FeedQuery) -> Result<Page<PostView>>;

    async fn get_post(&self, post_id: Uuid) -> Result<PostView>;

    async fn create_post(&self, post: &NewPost) -> Result<PostView>;

    /// Like the post, or remove the caller's like. Returns the updated post.
    async fn toggle_like(&self, post_id: Uuid) -> Result<PostView>;

    async fn add_comment(&self, post_id: Uuid, content: &str) -> Result<PostView>;
}
