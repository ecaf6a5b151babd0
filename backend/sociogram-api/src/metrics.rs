//! Prometheus metrics for sociogram-api.
//!
//! Collectors register with the default registry on first use; `/metrics`
//! renders everything `prometheus::gather` returns.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Like toggles by resulting transition (liked/unliked).
    pub static ref POST_LIKES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_likes_total",
        "Like toggles segmented by transition",
        &["transition"]
    )
    .expect("failed to register post_likes_total");

    /// Comment mutations (added/deleted).
    pub static ref POST_COMMENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_comments_total",
        "Comment mutations segmented by action",
        &["action"]
    )
    .expect("failed to register post_comments_total");

    /// Push notification attempts (sent/failed).
    pub static ref PUSH_NOTIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "push_notifications_total",
        "Push notification attempts segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register push_notifications_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
