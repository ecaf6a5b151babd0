/// Ownership checks for posts and comments
///
/// Only the author of a post may edit or delete it; only the author of a
/// comment may delete it.
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, Post};

/// Check if a user owns a post
pub fn check_post_ownership(user_id: Uuid, post: &Post) -> Result<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ))
    }
}

/// Check if a user owns a comment
pub fn check_comment_ownership(user_id: Uuid, comment: &Comment) -> Result<()> {
    if comment.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to delete this comment".to_string(),
        ))
    }
}
