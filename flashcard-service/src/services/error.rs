use service_core::error::AppError;
use thiserror::Error;

use super::providers::ProviderError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("AI provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Deck not found")]
    DeckNotFound,

    #[error("Card not found")]
    CardNotFound,

    #[error("Deck is being modified by another request")]
    DeckBusy,

    #[error("No decks found")]
    NoDecks,

    #[error("{0}")]
    Validation(String),

    #[error("Unsupported file type")]
    UnsupportedFileType,

    #[error("No content could be extracted from the file")]
    EmptyContent,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Provider(e) => e.into(),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid email or password"))
            }
            ServiceError::UserAlreadyExists => {
                AppError::BadRequest(anyhow::anyhow!("User already exists"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::DeckNotFound => AppError::NotFound(anyhow::anyhow!("Deck not found")),
            ServiceError::CardNotFound => AppError::NotFound(anyhow::anyhow!("Card not found")),
            ServiceError::DeckBusy => AppError::Conflict(anyhow::anyhow!(
                "Deck is being modified by another request, please retry"
            )),
            ServiceError::NoDecks => AppError::NotFound(anyhow::anyhow!("No decks found")),
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::UnsupportedFileType => {
                AppError::BadRequest(anyhow::anyhow!("Unsupported file type"))
            }
            ServiceError::EmptyContent => AppError::BadRequest(anyhow::anyhow!(
                "No content could be extracted from the file"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn maps_to_http_status() {
        let cases = [
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::UserAlreadyExists, StatusCode::BAD_REQUEST),
            (ServiceError::DeckNotFound, StatusCode::NOT_FOUND),
            (ServiceError::CardNotFound, StatusCode::NOT_FOUND),
            (ServiceError::DeckBusy, StatusCode::CONFLICT),
            (ServiceError::NoDecks, StatusCode::NOT_FOUND),
            (ServiceError::UnsupportedFileType, StatusCode::BAD_REQUEST),
            (
                ServiceError::Validation("No text provided".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn user_facing_messages_are_preserved() {
        let app: AppError = ServiceError::UserAlreadyExists.into();
        assert_eq!(app.to_string(), "Bad request: User already exists");
    }
}
