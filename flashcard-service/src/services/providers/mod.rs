//! Generative AI provider abstraction.
//!
//! Flashcard generation, quiz questions and image/video extraction all go
//! through [`TextProvider`], so the Gemini backend can be swapped for the mock
//! in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

pub use gemini::{GeminiConfig, GeminiTextProvider};
pub use mock::MockTextProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => AppError::TooManyRequests(
                "AI provider is rate limiting requests, try again shortly".to_string(),
                None,
            ),
            ProviderError::ContentFiltered => AppError::BadRequest(anyhow::anyhow!(
                "The content was rejected by the AI provider's safety filters"
            )),
            // Upstream detail is logged, never returned to the caller.
            ProviderError::InvalidRequest(msg) => {
                tracing::warn!(error = %msg, "AI provider rejected the request");
                AppError::BadRequest(anyhow::anyhow!("The AI provider rejected the request"))
            }
            ProviderError::NotConfigured(msg) => {
                tracing::error!(error = %msg, "AI provider not configured");
                AppError::ServiceUnavailable
            }
            ProviderError::ApiError(msg) | ProviderError::NetworkError(msg) => {
                tracing::error!(error = %msg, "AI provider request failed");
                AppError::BadGateway("AI provider request failed".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Error,
}

pub struct ProviderResponse {
    pub text: Option<String>,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    /// Ask the model for `application/json` output.
    pub json_output: bool,
}

/// Raw file bytes sent alongside the prompt (images, video).
#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        attachments: &[Attachment],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn upstream_error_text_stays_out_of_the_response() {
        use axum::{body::to_bytes, response::IntoResponse};

        for err in [
            ProviderError::NetworkError("connect to https://host/?key=abc failed".into()),
            ProviderError::ApiError("Gemini API error 500: key=abc".into()),
            ProviderError::InvalidRequest("bad field, key=abc".into()),
        ] {
            let res = AppError::from(err).into_response();
            let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let body = String::from_utf8_lossy(&body);
            assert!(!body.contains("key=abc"), "leaked: {}", body);
        }
    }

    #[test]
    fn provider_errors_map_to_gateway_statuses() {
        let status = |e: ProviderError| AppError::from(e).status_code();

        assert_eq!(
            status(ProviderError::ApiError("500".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(ProviderError::NetworkError("reset".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(ProviderError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status(ProviderError::ContentFiltered), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(ProviderError::NotConfigured("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
