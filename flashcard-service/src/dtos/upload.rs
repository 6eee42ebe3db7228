use super::decks::CardResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TextUploadRequest {
    #[schema(example = "The French Revolution began in 1789...")]
    pub text: String,
    pub deck_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub deck_id: String,
    pub cards: Vec<CardResponse>,
    #[schema(example = "Successfully generated 10 flashcards")]
    pub message: String,
}

/// Multipart form accepted by `POST /upload/process` (documentation only).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct FileUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub deck_name: Option<String>,
    /// Comma separated
    pub tags: Option<String>,
}
