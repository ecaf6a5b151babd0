//! Feed screen state with optimistic like and comment updates
//!
//! A like or comment is applied to the local copy of the post before the
//! request goes out. A successful response replaces the local copy with the
//! server's aggregate. A failed one triggers a re-fetch of the post so the
//! local copy converges to what the server holds; if that also fails the
//! pre-action copy is restored.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::FeedBackend;
use crate::error::{ClientError, Result};
use crate::models::{Account, AuthorSummary, CommentView, FeedQuery, NewPost, Pagination, PostView, SignupRequest};

pub const MAX_COMMENT_LENGTH: usize = 1000;

pub struct FeedState<B> {
    backend: B,
    viewer: Option<AuthorSummary>,
    posts: Vec<PostView>,
    pagination: Option<Pagination>,
    username_filter: Option<String>,
}

impl<B: FeedBackend> FeedState<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            viewer: None,
            posts: Vec::new(),
            pagination: None,
            username_filter: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn viewer(&self) -> Option<&AuthorSummary> {
        self.viewer.as_ref()
    }

    pub fn set_viewer(&mut self, account: &Account) {
        self.viewer = Some(account.summary());
    }

    pub fn posts(&self) -> &[PostView] {
        &self.posts
    }

    pub fn post(&self, post_id: Uuid) -> Option<&PostView> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    pub fn has_more(&self) -> bool {
        self.pagination.map(|p| p.has_next()).unwrap_or(false)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Account> {
        let session = self.backend.login(email, password).await?;
        self.set_viewer(&session.user);
        Ok(session.user)
    }

    pub async fn signup(&mut self, request: &SignupRequest) -> Result<Account> {
        let session = self.backend.signup(request).await?;
        self.set_viewer(&session.user);
        Ok(session.user)
    }

    /// Reload the first page, optionally restricted to one author.
    pub async fn refresh(&mut self, username: Option<&str>) -> Result<()> {
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let query = FeedQuery {
            page: Some(1),
            limit: None,
            username: username.clone(),
        };

        let page = self.backend.feed(&query).await?;
        self.posts = page.items;
        self.pagination = Some(page.pagination);
        self.username_filter = username;
        Ok(())
    }

    /// Append the next page. Returns how many posts were added.
    pub async fn load_more(&mut self) -> Result<usize> {
        let Some(current) = self.pagination.filter(|p| p.has_next()) else {
            return Ok(0);
        };
        let query = FeedQuery {
            page: Some(current.page + 1),
            limit: Some(current.limit),
            username: self.username_filter.clone(),
        };

        let page = self.backend.feed(&query).await?;
        let before = self.posts.len();
        for post in page.items {
            // A post created since the last page shifts the offsets by one.
            if self.post(post.id).is_none() {
                self.posts.push(post);
            }
        }
        self.pagination = Some(page.pagination);
        Ok(self.posts.len() - before)
    }

    pub async fn create_post(&mut self, post: NewPost) -> Result<PostView> {
        if self.viewer.is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        let created = self.backend.create_post(&post).await?;
        self.posts.insert(0, created.clone());
        Ok(created)
    }

    pub async fn toggle_like(&mut self, post_id: Uuid) -> Result<PostView> {
        let viewer = self.viewer.clone().ok_or(ClientError::NotAuthenticated)?;

        let snapshot = self.post(post_id).cloned();
        if let Some(post) = self.post_mut(post_id) {
            let liked = post.toggle_like_locally(viewer.id);
            debug!(%post_id, liked, "applied like optimistically");
        }

        let outcome = self.backend.toggle_like(post_id).await;
        self.reconcile(post_id, outcome, snapshot).await
    }

    pub async fn add_comment(&mut self, post_id: Uuid, content: &str) -> Result<PostView> {
        let viewer = self.viewer.clone().ok_or(ClientError::NotAuthenticated)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Invalid("Comment cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(ClientError::Invalid(format!(
                "Comment cannot exceed {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        let snapshot = self.post(post_id).cloned();
        if let Some(post) = self.post_mut(post_id) {
            post.append_comment_locally(CommentView {
                id: Uuid::new_v4(),
                author: viewer,
                content: content.to_string(),
                created_at: Utc::now(),
            });
        }

        let outcome = self.backend.add_comment(post_id, content).await;
        self.reconcile(post_id, outcome, snapshot).await
    }

    fn post_mut(&mut self, post_id: Uuid) -> Option<&mut PostView> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    fn replace(&mut self, post: PostView) {
        if let Some(local) = self.post_mut(post.id) {
            *local = post;
        }
    }

    async fn reconcile(
        &mut self,
        post_id: Uuid,
        outcome: Result<PostView>,
        snapshot: Option<PostView>,
    ) -> Result<PostView> {
        let err = match outcome {
            Ok(post) => {
                self.replace(post.clone());
                return Ok(post);
            }
            Err(err) => err,
        };

        warn!(%post_id, error = %err, "optimistic update rejected, re-fetching post");
        match self.backend.get_post(post_id).await {
            Ok(fresh) => self.replace(fresh),
            Err(refetch) if refetch.is_not_found() => {
                self.posts.retain(|p| p.id != post_id);
            }
            Err(refetch) => {
                warn!(%post_id, error = %refetch, "re-fetch failed, restoring local copy");
                if let Some(previous) = snapshot {
                    self.replace(previous);
                }
            }
        }
        Err(err)
    }
}
