use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{auth::UpdateProfileRequest, ErrorResponse},
    middleware::AuthUser,
    models::SanitizedUser,
    utils::ValidatedJson,
    AppState,
};

/// Update the caller's display name or avatar.
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = SanitizedUser),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<SanitizedUser>, AppError> {
    let profile = state.auth_service.update_profile(user.id(), req).await?;
    Ok(Json(profile))
}
