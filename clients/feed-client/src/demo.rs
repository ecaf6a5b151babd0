//! Offline backend for demos and UI development
//!
//! Holds an explicitly seeded set of accounts and posts in memory and answers
//! with the same statuses and messages as the real API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::FeedBackend;
use crate::error::{ClientError, Result};
use crate::models::{
    Account, AuthorSummary, CommentView, FeedQuery, NewPost, Notification, NotificationKind, Page,
    Pagination, PostView, Session, SignupRequest, UserStats,
};

/// Password of every account in [`DemoSeed::sample`].
pub const DEMO_PASSWORD: &str = "DemoPass123";

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 50;
const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub account: Account,
    pub password: String,
}

/// A notification addressed to one account
#[derive(Debug, Clone)]
pub struct InboxEntry {
    pub recipient: Uuid,
    pub notification: Notification,
}

impl InboxEntry {
    fn new(
        recipient: Uuid,
        kind: NotificationKind,
        actor: AuthorSummary,
        post: &PostView,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            recipient,
            notification: Notification {
                id: Uuid::new_v4(),
                kind,
                actor,
                post_id: post.id,
                post_preview: post.content.chars().take(PREVIEW_CHARS).collect(),
                created_at,
                is_read: false,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemoSeed {
    pub accounts: Vec<DemoAccount>,
    pub posts: Vec<PostView>,
    pub inbox: Vec<InboxEntry>,
}

impl DemoSeed {
    /// A small community with a dozen posts, timestamped relative to `now`.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let people = [
            ("jane_dev", "Jane Doe", "jane@demo.dev"),
            ("alex_tech", "Alex Kim", "alex@demo.dev"),
            ("sarah_dev", "Sarah Lee", "sarah@demo.dev"),
            ("john_codes", "John Park", "john@demo.dev"),
            ("emma_design", "Emma Ruiz", "emma@demo.dev"),
        ];
        let accounts: Vec<DemoAccount> = people
            .iter()
            .map(|(username, full_name, email)| DemoAccount {
                account: Account {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    email: email.to_string(),
                    full_name: full_name.to_string(),
                    bio: None,
                    profile_image: None,
                    device_token: None,
                    created_at: now - chrono::Duration::days(30),
                    updated_at: now - chrono::Duration::days(30),
                },
                password: DEMO_PASSWORD.to_string(),
            })
            .collect();

        // (author, content, hours ago, likers, comments as (author, text))
        let posts: [(usize, &str, i64, &[usize], &[(usize, &str)]); 12] = [
            (1, "Shipped the first build of the new app today", 2, &[2, 3], &[(2, "Congrats on the launch!"), (1, "Thanks, it was a long week")]),
            (2, "Cross-platform tooling has come a long way", 4, &[1], &[(3, "Agreed, the ecosystem is mature now")]),
            (3, "Coffee first, then the borrow checker", 6, &[], &[]),
            (4, "Design tip: test every screen on a small phone", 8, &[1, 2, 3], &[(0, "Saved me more than once")]),
            (0, "Finally understood async properly", 12, &[4], &[]),
            (1, "Typed APIs make refactoring painless", 24, &[0, 2], &[]),
            (2, "Pair programming session went really well", 30, &[], &[(4, "Love to hear it")]),
            (3, "Reading about database indexes this weekend", 36, &[1], &[]),
            (4, "New icon set is finished", 48, &[0], &[(1, "These look sharp")]),
            (0, "Notifications are working end to end", 60, &[], &[]),
            (1, "Who else is going to the meetup on Friday?", 72, &[2, 4], &[(3, "Count me in")]),
            (2, "Small pull requests get reviewed faster", 96, &[3], &[]),
        ];

        let posts = posts
            .iter()
            .map(|(author, content, hours_ago, likers, comments)| {
                let created_at = now - chrono::Duration::hours(*hours_ago);
                let comments: Vec<CommentView> = comments
                    .iter()
                    .enumerate()
                    .map(|(i, (commenter, text))| CommentView {
                        id: Uuid::new_v4(),
                        author: accounts[*commenter].account.summary(),
                        content: text.to_string(),
                        created_at: created_at + chrono::Duration::minutes(10 * (i as i64 + 1)),
                    })
                    .collect();
                let likes: Vec<Uuid> = likers.iter().map(|i| accounts[*i].account.id).collect();

                PostView {
                    id: Uuid::new_v4(),
                    author: accounts[*author].account.summary(),
                    content: content.to_string(),
                    tags: Vec::new(),
                    like_count: likes.len(),
                    likes,
                    comment_count: comments.len(),
                    updated_at: comments.last().map(|c| c.created_at).unwrap_or(created_at),
                    comments,
                    created_at,
                }
            })
            .collect::<Vec<PostView>>();

        // Activity on each post lands in its author's inbox; anything older
        // than a few hours has been seen already.
        let mut inbox = Vec::new();
        for post in &posts {
            let recipient = post.author.id;
            let seen = now - post.created_at > chrono::Duration::hours(4);
            for liker in &post.likes {
                if let Some(actor) = accounts.iter().find(|a| a.account.id == *liker) {
                    let mut entry = InboxEntry::new(
                        recipient,
                        NotificationKind::Like,
                        actor.account.summary(),
                        post,
                        post.created_at + chrono::Duration::minutes(5),
                    );
                    entry.notification.is_read = seen;
                    inbox.push(entry);
                }
            }
            for comment in post.comments.iter().filter(|c| c.author.id != recipient) {
                let mut entry = InboxEntry::new(
                    recipient,
                    NotificationKind::Comment,
                    comment.author.clone(),
                    post,
                    comment.created_at,
                );
                entry.notification.is_read = seen;
                inbox.push(entry);
            }
        }

        Self {
            accounts,
            posts,
            inbox,
        }
    }
}

struct DemoState {
    accounts: Vec<DemoAccount>,
    /// Newest first
    posts: Vec<PostView>,
    /// Newest first
    inbox: Vec<InboxEntry>,
    current: Option<Uuid>,
}

impl DemoState {
    fn from_seed(seed: DemoSeed) -> Self {
        let mut posts = seed.posts;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut inbox = seed.inbox;
        inbox.sort_by(|a, b| b.notification.created_at.cmp(&a.notification.created_at));
        Self {
            accounts: seed.accounts,
            posts,
            inbox,
            current: None,
        }
    }

    fn viewer(&self) -> Result<AuthorSummary> {
        self.current
            .and_then(|id| self.accounts.iter().find(|a| a.account.id == id))
            .map(|a| a.account.summary())
            .ok_or_else(|| ClientError::api(401, "Missing Authorization header"))
    }

    fn post_mut(&mut self, post_id: Uuid) -> Result<&mut PostView> {
        self.posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| ClientError::api(404, "Post not found"))
    }

    fn notify(&mut self, kind: NotificationKind, actor: AuthorSummary, post: &PostView) {
        let entry = InboxEntry::new(post.author.id, kind, actor, post, Utc::now());
        self.inbox.insert(0, entry);
    }

    fn start_session(&mut self, account: Account) -> Session {
        self.current = Some(account.id);
        Session {
            token: format!("demo-{}", account.id),
            user: account,
        }
    }
}

pub struct DemoBackend {
    state: Mutex<DemoState>,
    latency: Duration,
}

impl DemoBackend {
    pub fn new(seed: DemoSeed) -> Self {
        Self {
            state: Mutex::new(DemoState::from_seed(seed)),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call, to exercise loading states.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Drop all changes and the current session, starting over from `seed`.
    pub async fn reset(&self, seed: DemoSeed) {
        *self.state.lock().await = DemoState::from_seed(seed);
    }

    pub async fn sign_out(&self) {
        self.state.lock().await.current = None;
    }

    /// The signed-in account's notifications, newest first.
    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.pause().await;
        let state = self.state.lock().await;
        let viewer = state.viewer()?;
        Ok(state
            .inbox
            .iter()
            .filter(|e| e.recipient == viewer.id)
            .map(|e| e.notification.clone())
            .collect())
    }

    pub async fn unread_count(&self) -> Result<usize> {
        self.pause().await;
        let state = self.state.lock().await;
        let viewer = state.viewer()?;
        Ok(state
            .inbox
            .iter()
            .filter(|e| e.recipient == viewer.id && !e.notification.is_read)
            .count())
    }

    /// Mark every notification of the signed-in account read. Returns how
    /// many changed.
    pub async fn mark_notifications_read(&self) -> Result<usize> {
        self.pause().await;
        let mut state = self.state.lock().await;
        let viewer = state.viewer()?;
        let mut marked = 0;
        for entry in state
            .inbox
            .iter_mut()
            .filter(|e| e.recipient == viewer.id && !e.notification.is_read)
        {
            entry.notification.is_read = true;
            marked += 1;
        }
        Ok(marked)
    }

    /// Post count and likes received across all of a user's posts.
    pub async fn user_stats(&self, username: &str) -> Result<UserStats> {
        self.pause().await;
        let username = username.trim().to_lowercase();
        let state = self.state.lock().await;
        let author = state
            .accounts
            .iter()
            .find(|a| a.account.username == username)
            .map(|a| a.account.id)
            .ok_or_else(|| ClientError::api(404, "User not found"))?;

        let posts = state.posts.iter().filter(|p| p.author.id == author);
        let (post_count, total_likes) =
            posts.fold((0, 0), |(count, likes), p| (count + 1, likes + p.like_count));
        Ok(UserStats {
            post_count,
            total_likes,
        })
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl FeedBackend for DemoBackend {
    async fn signup(&self, request: &SignupRequest) -> Result<Session> {
        self.pause().await;
        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_lowercase();
        if username.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(ClientError::api(400, "Username, email and password are required"));
        }

        let mut state = self.state.lock().await;
        let taken = state
            .accounts
            .iter()
            .any(|a| a.account.username == username || a.account.email == email);
        if taken {
            return Err(ClientError::api(
                409,
                "User with this email or username already exists",
            ));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username,
            email,
            full_name: request.full_name.trim().to_string(),
            bio: None,
            profile_image: None,
            device_token: None,
            created_at: now,
            updated_at: now,
        };
        state.accounts.push(DemoAccount {
            account: account.clone(),
            password: request.password.clone(),
        });
        Ok(state.start_session(account))
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.pause().await;
        let email = email.trim().to_lowercase();
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .iter()
            .find(|a| a.account.email == email && a.password == password)
            .map(|a| a.account.clone())
            .ok_or_else(|| ClientError::api(401, "Invalid email or password"))?;
        Ok(state.start_session(account))
    }

    async fn feed(&self, query: &FeedQuery) -> Result<Page<PostView>> {
        self.pause().await;
        let page = query.page.unwrap_or(1).max(1);
        let limit = match query.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(limit) => limit.min(MAX_LIMIT),
        };

        let state = self.state.lock().await;
        let author = match query.username.as_deref().map(|u| u.trim().to_lowercase()) {
            Some(username) => Some(
                state
                    .accounts
                    .iter()
                    .find(|a| a.account.username == username)
                    .map(|a| a.account.id)
                    .ok_or_else(|| ClientError::api(404, "User not found"))?,
            ),
            None => None,
        };

        let matching: Vec<&PostView> = state
            .posts
            .iter()
            .filter(|p| author.map_or(true, |id| p.author.id == id))
            .collect();
        let total = matching.len() as u64;
        let offset = u64::from(page - 1) * u64::from(limit);
        let items = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages: total.div_ceil(u64::from(limit)),
            },
        })
    }

    async fn get_post(&self, post_id: Uuid) -> Result<PostView> {
        self.pause().await;
        let mut state = self.state.lock().await;
        state.post_mut(post_id).map(|p| p.clone())
    }

    async fn create_post(&self, post: &NewPost) -> Result<PostView> {
        self.pause().await;
        let content = post.content.trim();
        if content.is_empty() {
            return Err(ClientError::api(400, "content: Post content cannot be empty"));
        }

        let mut state = self.state.lock().await;
        let author = state.viewer()?;
        let now = Utc::now();
        let mut tags: Vec<String> = Vec::new();
        for tag in post.tags.iter().flatten() {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let created = PostView {
            id: Uuid::new_v4(),
            author,
            content: content.to_string(),
            tags,
            likes: Vec::new(),
            comments: Vec::new(),
            like_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(0, created.clone());
        Ok(created)
    }

    async fn toggle_like(&self, post_id: Uuid) -> Result<PostView> {
        self.pause().await;
        let mut state = self.state.lock().await;
        let viewer = state.viewer()?;
        let post = state.post_mut(post_id)?;
        let liked = post.toggle_like_locally(viewer.id);
        post.updated_at = Utc::now();
        let post = post.clone();

        if liked {
            state.notify(NotificationKind::Like, viewer, &post);
        }
        Ok(post)
    }

    async fn add_comment(&self, post_id: Uuid, content: &str) -> Result<PostView> {
        self.pause().await;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::api(400, "content: Comment cannot be empty"));
        }

        let mut state = self.state.lock().await;
        let viewer = state.viewer()?;
        let post = state.post_mut(post_id)?;
        let now = Utc::now();
        post.append_comment_locally(CommentView {
            id: Uuid::new_v4(),
            author: viewer.clone(),
            content: content.to_string(),
            created_at: now,
        });
        post.updated_at = now;
        let post = post.clone();

        if post.author.id != viewer.id {
            state.notify(NotificationKind::Comment, viewer, &post);
        }
        Ok(post)
    }
}
