//! Client library for the Sociogram feed API
//!
//! - [`ApiClient`]: typed HTTP client with a fixed request timeout
//! - [`FeedState`]: feed list with optimistic like and comment updates
//! - [`DemoBackend`]: seeded in-memory stand-in for offline use, with a
//!   notification inbox

pub mod backend;
pub mod client;
pub mod demo;
pub mod error;
pub mod models;
pub mod state;

pub use backend::FeedBackend;
pub use client::{ApiClient, REQUEST_TIMEOUT};
pub use demo::{DemoAccount, DemoBackend, DemoSeed, InboxEntry, DEMO_PASSWORD};
pub use error::{ClientError, Result};
pub use models::{
    Account, AuthorSummary, CommentView, FeedQuery, NewPost, Notification, NotificationKind, Page,
    Pagination, PostView, ProfileUpdate, Session, SignupRequest, UserProfile, UserStats,
};
pub use state::FeedState;
