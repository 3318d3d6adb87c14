use axum::{extract::Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::kernel::ServerDeps;

#[derive(Serialize)]
pub struct HealthResponse {
    success: bool,
    message: String,
    storage: StorageHealth,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StorageHealth {
    backend: String,
    status: String,
}

/// Liveness probe. Reports which storage backend the process selected at
/// startup (postgres, or the in-process fallback).
pub async fn health_handler(Extension(deps): Extension<Arc<ServerDeps>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Civic Connect backend is running".to_string(),
        storage: StorageHealth {
            backend: deps.storage_backend.to_string(),
            status: "ok".to_string(),
        },
        timestamp: Utc::now(),
    })
}
