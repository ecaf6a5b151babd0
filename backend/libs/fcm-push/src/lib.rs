/// Firebase Cloud Messaging client for Sociogram push notifications
///
/// Delivers single-device notifications through the FCM HTTP v1 API:
/// - OAuth2 access tokens minted from a Google service account
/// - Access-token caching with refresh one minute before expiry
/// - Device token sanity checks before any network call

pub mod client;
pub mod errors;
pub mod models;

pub use client::FcmClient;
pub use errors::FcmError;
pub use models::{FcmSendResult, ServiceAccountKey};
