use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        decks::{
            CardRequest, CardResponse, DeckResponse, ReviewRequest, ReviewResponse,
            StudySessionRequest, UpdateCardRequest,
        },
        ErrorResponse, MessageResponse,
    },
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

fn parse_card_id(raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid card id: {}", raw)))
}

#[utoipa::path(
    post,
    path = "/decks/{deck_id}/cards",
    params(("deck_id" = String, Path, description = "Deck id")),
    request_body = CardRequest,
    responses(
        (status = 201, description = "Card added", body = CardResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Deck not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cards"
)]
pub async fn add_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(deck_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), AppError> {
    let card = state.deck_service.add_card(user.id(), &deck_id, req).await?;
    Ok((StatusCode::CREATED, Json(CardResponse::from(&card))))
}

#[utoipa::path(
    put,
    path = "/decks/{deck_id}/cards/{card_id}",
    params(
        ("deck_id" = String, Path, description = "Deck id"),
        ("card_id" = u32, Path, description = "Card id within the deck")
    ),
    request_body = UpdateCardRequest,
    responses(
        (status = 200, description = "Card updated", body = CardResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Deck or card not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cards"
)]
pub async fn update_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path((deck_id, card_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateCardRequest>,
) -> Result<Json<CardResponse>, AppError> {
    let card_id = parse_card_id(&card_id)?;
    let card = state
        .deck_service
        .update_card(user.id(), &deck_id, card_id, req)
        .await?;
    Ok(Json(CardResponse::from(&card)))
}

#[utoipa::path(
    delete,
    path = "/decks/{deck_id}/cards/{card_id}",
    params(
        ("deck_id" = String, Path, description = "Deck id"),
        ("card_id" = u32, Path, description = "Card id within the deck")
    ),
    responses(
        (status = 200, description = "Card deleted", body = MessageResponse),
        (status = 404, description = "Deck or card not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cards"
)]
pub async fn delete_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path((deck_id, card_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let card_id = parse_card_id(&card_id)?;
    state
        .deck_service
        .delete_card(user.id(), &deck_id, card_id)
        .await?;
    Ok(Json(MessageResponse::new("Card deleted successfully")))
}

/// Record a review and reschedule the card.
#[utoipa::path(
    post,
    path = "/decks/{deck_id}/cards/{card_id}/review",
    params(
        ("deck_id" = String, Path, description = "Deck id"),
        ("card_id" = u32, Path, description = "Card id within the deck")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = ReviewResponse),
        (status = 400, description = "Invalid card id", body = ErrorResponse),
        (status = 404, description = "Deck or card not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cards"
)]
pub async fn review_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path((deck_id, card_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let card_id = parse_card_id(&card_id)?;
    let card = state
        .deck_service
        .review_card(user.id(), &deck_id, card_id, req.correct)
        .await?;

    Ok(Json(ReviewResponse {
        message: "Card reviewed successfully".to_string(),
        card: CardResponse::from(&card),
    }))
}

/// Record a finished study session and fold its score into the deck average.
#[utoipa::path(
    post,
    path = "/decks/{deck_id}/sessions",
    params(("deck_id" = String, Path, description = "Deck id")),
    request_body = StudySessionRequest,
    responses(
        (status = 200, description = "Session recorded", body = DeckResponse),
        (status = 400, description = "Score out of range", body = ErrorResponse),
        (status = 404, description = "Deck not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Decks"
)]
pub async fn record_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(deck_id): Path<String>,
    ValidatedJson(req): ValidatedJson<StudySessionRequest>,
) -> Result<Json<DeckResponse>, AppError> {
    let deck = state
        .deck_service
        .record_session(user.id(), &deck_id, req.score)
        .await?;
    Ok(Json(DeckResponse::from(&deck)))
}
