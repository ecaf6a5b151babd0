/// In-process repositories used by tests and `STORAGE_BACKEND=memory`.
///
/// Nothing here is global: each [`MemoryStore`] is an independent store,
/// created with [`MemoryStore::new`] and emptied with [`MemoryStore::reset`].
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostRepository, UserRepository, DUPLICATE_USER_MESSAGE};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, LikeTransition, NewPost, NewUser, PageRequest, Post, ProfileChanges, User,
};

/// Both in-memory repositories over shared state
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: MemoryUserRepository,
    posts: MemoryPostRepository,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> Arc<MemoryUserRepository> {
        Arc::new(self.users.clone())
    }

    pub fn posts(&self) -> Arc<MemoryPostRepository> {
        Arc::new(self.posts.clone())
    }

    /// Drop every user and post.
    pub async fn reset(&self) {
        self.users.users.write().await.clear();
        self.posts.posts.clear();
        self.posts.seq.store(0, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;

        let taken = users
            .values()
            .any(|u| u.email == new_user.email || u.username == new_user.username);
        if taken {
            return Err(AppError::Conflict(DUPLICATE_USER_MESSAGE.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            bio: None,
            profile_image: None,
            device_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(profile_image) = changes.profile_image {
            user.profile_image = Some(profile_image);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_device_token(&self, id: Uuid, device_token: &str) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.device_token = Some(device_token.to_string());
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn search(&self, query: &str, page: PageRequest) -> Result<(Vec<User>, u64)> {
        let needle = query.to_lowercase();
        let users = self.users.read().await;

        let mut matches: Vec<User> = users
            .values()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.full_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.username.cmp(&b.username));

        let total = matches.len() as u64;
        Ok((paginate(matches, page), total))
    }
}

#[derive(Clone)]
struct StoredPost {
    seq: u64,
    post: Post,
}

#[derive(Clone, Default)]
pub struct MemoryPostRepository {
    posts: Arc<DashMap<Uuid, StoredPost>>,
    seq: Arc<AtomicU64>,
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post> {
        let post = Post::new(new_post);
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.posts.insert(
            post.id,
            StoredPost {
                seq,
                post: post.clone(),
            },
        );
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|entry| entry.post.clone()))
    }

    async fn list(&self, author_id: Option<Uuid>, page: PageRequest) -> Result<(Vec<Post>, u64)> {
        let mut matches: Vec<StoredPost> = self
            .posts
            .iter()
            .filter(|entry| author_id.map_or(true, |id| entry.post.author_id == id))
            .map(|entry| entry.value().clone())
            .collect();
        // Insertion order stands in for creation time; timestamps can tie.
        matches.sort_by(|a, b| b.seq.cmp(&a.seq));

        let total = matches.len() as u64;
        let posts = paginate(matches, page).into_iter().map(|s| s.post).collect();
        Ok((posts, total))
    }

    async fn update_content(
        &self,
        id: Uuid,
        content: String,
        tags: Vec<String>,
    ) -> Result<Option<Post>> {
        Ok(self.posts.get_mut(&id).map(|mut entry| {
            entry.post.content = content;
            entry.post.tags = tags;
            entry.post.updated_at = Utc::now();
            entry.post.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.posts.remove(&id).is_some())
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<(Post, LikeTransition)>> {
        // The shard write lock is held for the whole read-modify-write.
        Ok(self.posts.get_mut(&id).map(|mut entry| {
            let transition = entry.post.toggle_like(user_id);
            (entry.post.clone(), transition)
        }))
    }

    async fn add_comment(&self, id: Uuid, comment: Comment) -> Result<Option<Post>> {
        Ok(self.posts.get_mut(&id).map(|mut entry| {
            entry.post.push_comment(comment);
            entry.post.clone()
        }))
    }

    async fn remove_comment(&self, id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get_mut(&id).map(|mut entry| {
            entry.post.remove_comment(comment_id);
            entry.post.clone()
        }))
    }
}
