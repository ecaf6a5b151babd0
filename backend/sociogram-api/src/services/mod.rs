/// Business logic layer
pub mod auth;
pub mod notifications;
pub mod posts;

pub use auth::AuthService;
pub use notifications::{
    LoggingNotifier, NotificationDispatcher, PushError, PushMessage, PushNotifier,
};
pub use posts::PostService;
