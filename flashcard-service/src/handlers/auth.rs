use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{AuthResponse, LoginRequest, SignupRequest},
        ErrorResponse, MessageResponse,
    },
    middleware::AuthUser,
    models::SanitizedUser,
    utils::{expired_token_cookie, token_cookie, ValidatedJson},
    AppState,
};

/// Register a new account and start a session.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input or user already exists", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let response = state.auth_service.signup(req).await?;
    let jar = jar.add(session_cookie(&state, response.token.clone()));

    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let response = state.auth_service.login(req).await?;
    let jar = jar.add(session_cookie(&state, response.token.clone()));

    Ok((jar, Json(response)))
}

/// End the browser session by expiring the token cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(expired_token_cookie(state.config.is_prod()));
    (jar, Json(MessageResponse::new("Logged out successfully")))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = SanitizedUser),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SanitizedUser>, AppError> {
    let profile = state.auth_service.me(user.id()).await?;
    Ok(Json(profile))
}

fn session_cookie(state: &AppState, token: String) -> axum_extra::extract::cookie::Cookie<'static> {
    token_cookie(token, state.jwt.expiry_days(), state.config.is_prod())
}
