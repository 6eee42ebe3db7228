use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

use crate::{
    dtos::{
        decks::{CreateDeckRequest, DeckResponse, DeckSummary, UpdateDeckRequest},
        ErrorResponse, MessageResponse,
    },
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// List the caller's decks, most recently updated first. Answers are omitted.
#[utoipa::path(
    get,
    path = "/decks",
    responses(
        (status = 200, description = "Decks owned by the caller", body = Vec<DeckSummary>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Decks"
)]
pub async fn list_decks(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<DeckSummary>>, AppError> {
    let now = Utc::now();
    let decks = state.deck_service.list(user.id()).await?;

    Ok(Json(
        decks
            .iter()
            .map(|deck| DeckSummary::from_deck(deck, now))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/decks",
    request_body = CreateDeckRequest,
    responses(
        (status = 201, description = "Deck created", body = DeckResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Decks"
)]
pub async fn create_deck(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateDeckRequest>,
) -> Result<(StatusCode, Json<DeckResponse>), AppError> {
    let deck = state.deck_service.create(user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(DeckResponse::from(&deck))))
}

/// Full deck including answers. Counts as a view.
#[utoipa::path(
    get,
    path = "/decks/{deck_id}",
    params(("deck_id" = String, Path, description = "Deck id")),
    responses(
        (status = 200, description = "Deck", body = DeckResponse),
        (status = 404, description = "Deck not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Decks"
)]
pub async fn get_deck(
    State(state): State<AppState>,
    user: AuthUser,
    Path(deck_id): Path<String>,
) -> Result<Json<DeckResponse>, AppError> {
    let deck = state.deck_service.view(user.id(), &deck_id).await?;
    Ok(Json(DeckResponse::from(&deck)))
}

#[utoipa::path(
    put,
    path = "/decks/{deck_id}",
    params(("deck_id" = String, Path, description = "Deck id")),
    request_body = UpdateDeckRequest,
    responses(
        (status = 200, description = "Deck updated", body = DeckResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Deck not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Decks"
)]
pub async fn update_deck(
    State(state): State<AppState>,
    user: AuthUser,
    Path(deck_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateDeckRequest>,
) -> Result<Json<DeckResponse>, AppError> {
    let deck = state.deck_service.update(user.id(), &deck_id, req).await?;
    Ok(Json(DeckResponse::from(&deck)))
}

#[utoipa::path(
    delete,
    path = "/decks/{deck_id}",
    params(("deck_id" = String, Path, description = "Deck id")),
    responses(
        (status = 200, description = "Deck deleted", body = MessageResponse),
        (status = 404, description = "Deck not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Decks"
)]
pub async fn delete_deck(
    State(state): State<AppState>,
    user: AuthUser,
    Path(deck_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.deck_service.delete(user.id(), &deck_id).await?;
    Ok(Json(MessageResponse::new("Deck deleted successfully")))
}
