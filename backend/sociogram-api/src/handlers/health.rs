use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::ok;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthStatus))
)]
pub async fn health() -> HttpResponse {
    ok(
        HealthStatus {
            status: "OK".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        "Server is running",
    )
}
