/// Storage layer
///
/// Handlers and services talk to storage only through the two repository
/// traits below. `AppState` holds them as `Arc<dyn ...>`, so the service runs
/// against Postgres in production and against [`memory`] in tests and demo
/// mode.
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, LikeTransition, NewPost, NewUser, PageRequest, Post, ProfileChanges, User};

pub mod memory;
pub mod post_repo;
pub mod user_repo;

pub use memory::{MemoryPostRepository, MemoryStore, MemoryUserRepository};
pub use post_repo::PgPostRepository;
pub use user_repo::PgUserRepository;

pub const DUPLICATE_USER_MESSAGE: &str = "User with this email or username already exists";

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `AppError::Conflict` when the username or
    /// email is already taken.
    async fn create(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Missing ids are skipped; order of the result is unspecified.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>>;

    async fn set_device_token(&self, id: Uuid, device_token: &str) -> Result<Option<User>>;

    /// Case-insensitive substring match on username or full name, ordered by
    /// username. Returns the page and the total number of matches.
    async fn search(&self, query: &str, page: PageRequest) -> Result<(Vec<User>, u64)>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, new_post: NewPost) -> Result<Post>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// Newest first, optionally restricted to one author. Returns the page
    /// and the total number of matching posts.
    async fn list(&self, author_id: Option<Uuid>, page: PageRequest) -> Result<(Vec<Post>, u64)>;

    async fn update_content(
        &self,
        id: Uuid,
        content: String,
        tags: Vec<String>,
    ) -> Result<Option<Post>>;

    /// Returns false when the post did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Add or remove `user_id` from the post's like set as one atomic step.
    ///
    /// Concurrent toggles on the same post are serialized, so the like set
    /// never gains a duplicate and no toggle is lost.
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<(Post, LikeTransition)>>;

    /// Append a comment atomically; concurrent appends are all kept.
    async fn add_comment(&self, id: Uuid, comment: Comment) -> Result<Option<Post>>;

    /// Remove a comment by id. Removing a comment that is already gone
    /// still returns the post.
    async fn remove_comment(&self, id: Uuid, comment_id: Uuid) -> Result<Option<Post>>;
}
