//! Mock provider for tests and offline development.

use super::{
    Attachment, FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;

pub struct MockTextProvider {
    enabled: bool,
    response: Option<String>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            response: None,
        }
    }

    /// Always answer with `text`.
    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            enabled: true,
            response: Some(text.into()),
        }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        attachments: &[Attachment],
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let text = match &self.response {
            Some(text) => text.clone(),
            None => format!(
                "Mock response for: {} ({} attachments)",
                prompt,
                attachments.len()
            ),
        };

        Ok(ProviderResponse {
            text: Some(text),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
