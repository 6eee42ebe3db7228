use axum::{extract::State, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::AppState;

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "MongoDB health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(json!({
        "status": "ok",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
