use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        decks::CardResponse,
        upload::{FileUploadForm, TextUploadRequest, UploadResponse},
        ErrorResponse,
    },
    middleware::AuthUser,
    models::{parse_tags, Deck},
    services::{GenerationSource, ServiceError, UploadedFile},
    utils::ValidatedJson,
    AppState,
};

const TEXT_DECK_NAME: &str = "Text Input Deck";
const TEXT_DECK_DESCRIPTION: &str = "Generated from text input";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BadRequest(anyhow::anyhow!("File too large"))
    } else {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    }
}

fn upload_response(deck: &Deck) -> UploadResponse {
    UploadResponse {
        deck_id: deck.id.clone(),
        cards: deck.cards.iter().map(CardResponse::from).collect(),
        message: format!("Successfully generated {} flashcards", deck.cards.len()),
    }
}

/// Extract study material from an uploaded file and turn it into a new deck.
#[utoipa::path(
    post,
    path = "/upload/process",
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Deck generated", body = UploadResponse),
        (status = 400, description = "Missing, empty or unsupported file", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Upload"
)]
pub async fn process_upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut deck_name: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or_default() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?.to_vec();

                file = Some(UploadedFile {
                    file_name,
                    mime_type,
                    data,
                });
            }
            "deck_name" => {
                let value = field.text().await.map_err(multipart_error)?;
                deck_name = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            "tags" => {
                let value = field.text().await.map_err(multipart_error)?;
                tags = parse_tags(&value);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    if file.data.is_empty() {
        return Err(ServiceError::EmptyContent.into());
    }
    if file.data.len() > state.config.upload.max_bytes {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "File too large (max {} bytes)",
            state.config.upload.max_bytes
        )));
    }

    tracing::info!(
        user_id = %user.id(),
        file_name = %file.file_name,
        mime_type = %file.mime_type,
        size = file.data.len(),
        "File upload started"
    );

    let file_name = file.file_name.clone();
    let content = state.extractor.extract(file).await?;
    let generated = state
        .generator
        .generate(&content, GenerationSource::File)
        .await;

    let deck = state
        .deck_service
        .create_generated(
            user.id(),
            deck_name.unwrap_or_else(|| file_name.clone()),
            format!("Generated from {}", file_name),
            tags,
            generated.cards,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(upload_response(&deck))))
}

/// Generate a deck from pasted text.
#[utoipa::path(
    post,
    path = "/upload/text",
    request_body = TextUploadRequest,
    responses(
        (status = 201, description = "Deck generated", body = UploadResponse),
        (status = 400, description = "No text provided", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Upload"
)]
pub async fn upload_text(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<TextUploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("No text provided")));
    }

    let generated = state.generator.generate(text, GenerationSource::Text).await;

    let deck_name = req
        .deck_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| TEXT_DECK_NAME.to_string());

    let deck = state
        .deck_service
        .create_generated(
            user.id(),
            deck_name,
            TEXT_DECK_DESCRIPTION.to_string(),
            req.tags,
            generated.cards,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(upload_response(&deck))))
}
