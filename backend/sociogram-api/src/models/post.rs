/// Post aggregate: the post document with its embedded likes and comments
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::AuthorSummary;

/// Comment owned by a post. Stored as an element of the post's JSONB array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
    /// Users who liked the post, in like order. Never holds a duplicate.
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
}

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTransition {
    Liked,
    Unliked,
}

impl LikeTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeTransition::Liked => "liked",
            LikeTransition::Unliked => "unliked",
        }
    }
}

impl Post {
    pub fn new(new_post: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            content: new_post.content,
            tags: new_post.tags,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }

    /// Remove the user's like if present, otherwise append it.
    pub fn toggle_like(&mut self, user_id: Uuid) -> LikeTransition {
        let transition = match self.likes.iter().position(|id| *id == user_id) {
            Some(index) => {
                self.likes.remove(index);
                LikeTransition::Unliked
            }
            None => {
                self.likes.push(user_id);
                LikeTransition::Liked
            }
        };
        self.updated_at = Utc::now();
        transition
    }

    pub fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
        self.updated_at = Utc::now();
    }

    pub fn find_comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let index = self.comments.iter().position(|c| c.id == comment_id)?;
        self.updated_at = Utc::now();
        Some(self.comments.remove(index))
    }

    /// Every user id the view needs expanded: the author plus comment authors.
    pub fn referenced_users(&self) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(1 + self.comments.len());
        ids.push(self.author_id);
        for comment in &self.comments {
            if !ids.contains(&comment.author_id) {
                ids.push(comment.author_id);
            }
        }
        ids
    }
}

/// Post as returned to clients, with author references expanded
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub author: AuthorSummary,
    pub content: String,
    pub tags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub like_count: usize,
    pub comment_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub author: AuthorSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(NewPost {
            author_id: Uuid::new_v4(),
            content: "hello".to_string(),
            tags: vec![],
        })
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut post = post();
        let user = Uuid::new_v4();

        assert_eq!(post.toggle_like(user), LikeTransition::Liked);
        assert_eq!(post.like_count(), 1);
        assert!(post.is_liked_by(user));

        assert_eq!(post.toggle_like(user), LikeTransition::Unliked);
        assert_eq!(post.like_count(), 0);
        assert!(!post.is_liked_by(user));
    }

    #[test]
    fn test_toggle_keeps_other_likes_in_order() {
        let mut post = post();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        post.toggle_like(a);
        post.toggle_like(b);
        post.toggle_like(c);
        post.toggle_like(b);
        assert_eq!(post.likes, vec![a, c]);
    }

    #[test]
    fn test_remove_comment() {
        let mut post = post();
        let comment = Comment::new(Uuid::new_v4(), "nice");
        let id = comment.id;
        post.push_comment(comment);
        assert_eq!(post.comment_count(), 1);

        assert!(post.remove_comment(Uuid::new_v4()).is_none());
        assert_eq!(post.remove_comment(id).map(|c| c.content), Some("nice".into()));
        assert_eq!(post.comment_count(), 0);
    }

    #[test]
    fn test_referenced_users_deduplicates() {
        let mut post = post();
        let commenter = Uuid::new_v4();
        post.push_comment(Comment::new(commenter, "one"));
        post.push_comment(Comment::new(commenter, "two"));
        post.push_comment(Comment::new(post.author_id, "reply"));
        assert_eq!(post.referenced_users(), vec![post.author_id, commenter]);
    }
}
