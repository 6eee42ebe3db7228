use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        quiz::{CompleteQuizRequest, CompleteQuizResponse, QuizQuery, QuizResponse, QuizType},
        ErrorResponse,
    },
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Build a quiz of up to ten questions from the caller's cards.
#[utoipa::path(
    get,
    path = "/quiz/generate",
    params(QuizQuery),
    responses(
        (status = 200, description = "Quiz questions", body = QuizResponse),
        (status = 400, description = "Unknown quiz type", body = ErrorResponse),
        (status = 404, description = "No decks found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Quiz"
)]
pub async fn generate_quiz(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<QuizQuery>,
) -> Result<Json<QuizResponse>, AppError> {
    let quiz_type = match query.quiz_type.as_deref() {
        None | Some("") => QuizType::default(),
        Some(raw) => raw
            .parse::<QuizType>()
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?,
    };

    let questions = state.quiz_service.generate(user.id(), quiz_type).await?;
    Ok(Json(QuizResponse { questions }))
}

/// Score a finished quiz and award XP, level and badges.
#[utoipa::path(
    post,
    path = "/quiz/complete",
    request_body = CompleteQuizRequest,
    responses(
        (status = 200, description = "Quiz scored", body = CompleteQuizResponse),
        (status = 400, description = "No results submitted", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Quiz"
)]
pub async fn complete_quiz(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CompleteQuizRequest>,
) -> Result<Json<CompleteQuizResponse>, AppError> {
    let response = state.quiz_service.complete(user.id(), req).await?;
    Ok(Json(response))
}
