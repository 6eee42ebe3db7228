use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{dashboard::DashboardResponse, ErrorResponse},
    middleware::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Study statistics and recent decks", body = DashboardResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let response = state.deck_service.dashboard(user.id()).await?;
    Ok(Json(response))
}
