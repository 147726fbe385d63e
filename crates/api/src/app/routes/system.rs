use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use gigboard_core::Timestamp;
use gigboard_infra::collections;

use crate::app::AppServices;

/// Health probe: one trivial write proves store connectivity.
pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let result = tokio::task::spawn_blocking(move || {
        services.store.insert(
            collections::HEALTH_CHECKS,
            json!({ "checked_at": Timestamp::now().canonical() }),
        )
    })
    .await;

    match result {
        Ok(Ok(_)) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Ok(Err(err)) => {
            error!(error = %err, "health probe write failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
        }
        Err(err) => {
            error!(error = %err, "health probe task failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
        }
    }
}
