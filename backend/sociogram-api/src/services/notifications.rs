/// Push notification side channel
///
/// Handlers never wait for delivery: [`NotificationDispatcher::dispatch`]
/// spawns the send on the runtime and only logs the outcome.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fcm_push::{FcmClient, FcmError};
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::PUSH_NOTIFICATIONS_TOTAL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn like(post_id: Uuid, liker_name: &str) -> Self {
        Self::for_post(
            post_id,
            "like",
            "New Like",
            format!("{} liked your post", liker_name),
        )
    }

    pub fn comment(post_id: Uuid, commenter_name: &str) -> Self {
        Self::for_post(
            post_id,
            "comment",
            "New Comment",
            format!("{} commented on your post", commenter_name),
        )
    }

    fn for_post(post_id: Uuid, kind: &str, title: &str, body: String) -> Self {
        let mut data = HashMap::new();
        data.insert("postId".to_string(), post_id.to_string());
        data.insert("type".to_string(), kind.to_string());
        Self {
            title: title.to_string(),
            body,
            data,
        }
    }
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("invalid device token")]
    InvalidToken,

    #[error("push delivery failed: {0}")]
    Delivery(String),
}

/// Delivers a message to one device.
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, device_token: &str, message: &PushMessage) -> Result<(), PushError>;
}

#[async_trait]
impl PushNotifier for FcmClient {
    async fn send(&self, device_token: &str, message: &PushMessage) -> Result<(), PushError> {
        FcmClient::send(self, device_token, &message.title, &message.body, &message.data)
            .await
            .map(|result| {
                tracing::debug!(message_id = %result.message_id, "FCM accepted notification");
            })
            .map_err(|e| match e {
                FcmError::InvalidToken => PushError::InvalidToken,
                other => PushError::Delivery(other.to_string()),
            })
    }
}

/// Used when FCM credentials are not configured.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl PushNotifier for LoggingNotifier {
    async fn send(&self, _device_token: &str, message: &PushMessage) -> Result<(), PushError> {
        tracing::info!(
            title = %message.title,
            body = %message.body,
            "push disabled, notification not delivered"
        );
        Ok(())
    }
}

/// Fire-and-forget front of a [`PushNotifier`]
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn PushNotifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn PushNotifier>) -> Self {
        Self { notifier }
    }

    /// Queue a notification. Failures are logged and counted, never returned.
    pub fn dispatch(&self, device_token: String, message: PushMessage) {
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            match notifier.send(&device_token, &message).await {
                Ok(()) => {
                    PUSH_NOTIFICATIONS_TOTAL.with_label_values(&["sent"]).inc();
                    tracing::debug!(title = %message.title, "push notification sent");
                }
                Err(e) => {
                    PUSH_NOTIFICATIONS_TOTAL.with_label_values(&["failed"]).inc();
                    tracing::warn!(error = %e, title = %message.title, "push notification failed");
                }
            }
        });
    }
}
