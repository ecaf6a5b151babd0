/// Post aggregate operations: CRUD, like toggle and comments
use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::notifications::{NotificationDispatcher, PushMessage};
use crate::db::{PostRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::metrics::{POST_COMMENTS_TOTAL, POST_LIKES_TOTAL};
use crate::middleware::permissions::{check_comment_ownership, check_post_ownership};
use crate::models::{
    AuthorSummary, Comment, CommentView, LikeTransition, NewPost, PageRequest, Post, PostView, User,
};
use crate::response::Pagination;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    notifications: NotificationDispatcher,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            posts,
            users,
            notifications,
        }
    }

    pub async fn create(&self, author_id: Uuid, content: &str, tags: Vec<String>) -> Result<PostView> {
        let post = self
            .posts
            .create(NewPost {
                author_id,
                content: content.trim().to_string(),
                tags,
            })
            .await?;

        tracing::info!(post_id = %post.id, author_id = %author_id, "post created");
        self.expand(post).await
    }

    /// Newest-first page of posts, optionally only those by `username`.
    pub async fn feed(
        &self,
        username: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<PostView>, Pagination)> {
        let author_id = match username.map(str::trim).filter(|u| !u.is_empty()) {
            Some(username) => Some(
                self.users
                    .find_by_username(&username.to_lowercase())
                    .await?
                    .ok_or(AppError::NotFound("User"))?
                    .id,
            ),
            None => None,
        };

        let (posts, total) = self.posts.list(author_id, page).await?;
        let views = self.expand_many(posts).await?;
        Ok((views, Pagination::new(page.page, page.limit, total)))
    }

    pub async fn get(&self, post_id: Uuid) -> Result<PostView> {
        let post = self.load(post_id).await?;
        self.expand(post).await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        content: &str,
        tags: Vec<String>,
    ) -> Result<PostView> {
        let post = self.load(post_id).await?;
        check_post_ownership(user_id, &post)?;

        let post = self
            .posts
            .update_content(post_id, content.trim().to_string(), tags)
            .await?
            .ok_or(AppError::NotFound("Post"))?;

        tracing::info!(post_id = %post_id, "post updated");
        self.expand(post).await
    }

    pub async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        let post = self.load(post_id).await?;
        check_post_ownership(user_id, &post)?;

        if !self.posts.delete(post_id).await? {
            return Err(AppError::NotFound("Post"));
        }

        tracing::info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    /// Like the post if the user has not, unlike it otherwise. Only the
    /// like transition notifies the author.
    pub async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<(PostView, LikeTransition)> {
        let (post, transition) = self
            .posts
            .toggle_like(post_id, user_id)
            .await?
            .ok_or(AppError::NotFound("Post"))?;

        POST_LIKES_TOTAL
            .with_label_values(&[transition.as_str()])
            .inc();
        tracing::info!(
            post_id = %post_id,
            user_id = %user_id,
            transition = transition.as_str(),
            like_count = post.like_count(),
            "like toggled"
        );

        let users = self.lookup(&post, user_id).await?;
        if transition == LikeTransition::Liked {
            self.notify_author(&post, &users, user_id, PushMessage::like);
        }

        Ok((render(post, &users), transition))
    }

    pub async fn add_comment(&self, user_id: Uuid, post_id: Uuid, content: &str) -> Result<PostView> {
        let comment = Comment::new(user_id, content.trim());

        let post = self
            .posts
            .add_comment(post_id, comment)
            .await?
            .ok_or(AppError::NotFound("Post"))?;

        POST_COMMENTS_TOTAL.with_label_values(&["added"]).inc();
        tracing::info!(
            post_id = %post_id,
            user_id = %user_id,
            comment_count = post.comment_count(),
            "comment added"
        );

        let users = self.lookup(&post, user_id).await?;
        if post.author_id != user_id {
            self.notify_author(&post, &users, user_id, PushMessage::comment);
        }

        Ok(render(post, &users))
    }

    pub async fn delete_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<PostView> {
        let post = self.load(post_id).await?;
        let comment = post
            .find_comment(comment_id)
            .ok_or(AppError::NotFound("Comment"))?;
        check_comment_ownership(user_id, comment)?;

        let post = self
            .posts
            .remove_comment(post_id, comment_id)
            .await?
            .ok_or(AppError::NotFound("Post"))?;

        POST_COMMENTS_TOTAL.with_label_values(&["deleted"]).inc();
        tracing::info!(post_id = %post_id, comment_id = %comment_id, "comment deleted");

        self.expand(post).await
    }

    async fn load(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(AppError::NotFound("Post"))
    }

    /// Users referenced by the post, plus `actor`, keyed by id.
    async fn lookup(&self, post: &Post, actor: Uuid) -> Result<HashMap<Uuid, User>> {
        let mut ids = post.referenced_users();
        if !ids.contains(&actor) {
            ids.push(actor);
        }
        self.users_by_id(&ids).await
    }

    async fn users_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>> {
        Ok(self
            .users
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }

    async fn expand(&self, post: Post) -> Result<PostView> {
        let users = self.users_by_id(&post.referenced_users()).await?;
        Ok(render(post, &users))
    }

    async fn expand_many(&self, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let mut ids: Vec<Uuid> = Vec::new();
        for post in &posts {
            for id in post.referenced_users() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        let users = self.users_by_id(&ids).await?;
        Ok(posts.into_iter().map(|p| render(p, &users)).collect())
    }

    fn notify_author(
        &self,
        post: &Post,
        users: &HashMap<Uuid, User>,
        actor: Uuid,
        message: fn(Uuid, &str) -> PushMessage,
    ) {
        let Some(device_token) = users
            .get(&post.author_id)
            .and_then(|author| author.device_token.clone())
        else {
            return;
        };

        let actor_name = users
            .get(&actor)
            .map(|u| u.full_name.as_str())
            .unwrap_or("Someone");

        self.notifications
            .dispatch(device_token, message(post.id, actor_name));
    }
}

fn summary(users: &HashMap<Uuid, User>, id: Uuid) -> AuthorSummary {
    match users.get(&id) {
        Some(user) => user.summary(),
        None => {
            tracing::warn!(user_id = %id, "referenced user not found");
            AuthorSummary::unknown(id)
        }
    }
}

fn render(post: Post, users: &HashMap<Uuid, User>) -> PostView {
    let comments = post
        .comments
        .iter()
        .map(|c| CommentView {
            id: c.id,
            author: summary(users, c.author_id),
            content: c.content.clone(),
            created_at: c.created_at,
        })
        .collect();

    PostView {
        id: post.id,
        author: summary(users, post.author_id),
        like_count: post.like_count(),
        comment_count: post.comment_count(),
        content: post.content,
        tags: post.tags,
        likes: post.likes,
        comments,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}
