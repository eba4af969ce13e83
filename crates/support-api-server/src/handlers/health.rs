use axum::Json;
use chrono::Utc;

use crate::models::chat::{HealthResponse, ServiceInfo};

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Customer Support Bot API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}
