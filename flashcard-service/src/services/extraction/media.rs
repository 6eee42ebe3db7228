use super::{Extractor, FileKind, UploadedFile};
use crate::services::providers::{Attachment, GenerationParams, TextProvider};
use crate::services::{metrics, ServiceError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

const IMAGE_PROMPT: &str = "Extract all legible text from this image. Then describe any \
educational content it shows (diagrams, formulas, charts, key concepts) in plain prose so \
it can be turned into study flashcards.";

const VIDEO_PROMPT: &str = "Transcribe the spoken content of this video. Then write a short \
summary of the key concepts, definitions and facts it teaches so it can be turned into study \
flashcards.";

/// Images and video go to the multimodal model with the file inline.
pub struct MediaExtractor {
    kind: FileKind,
    provider: Arc<dyn TextProvider>,
}

impl MediaExtractor {
    pub fn image(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            kind: FileKind::Image,
            provider,
        }
    }

    pub fn video(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            kind: FileKind::Video,
            provider,
        }
    }

    fn prompt(&self) -> &'static str {
        match self.kind {
            FileKind::Video => VIDEO_PROMPT,
            _ => IMAGE_PROMPT,
        }
    }
}

#[async_trait]
impl Extractor for MediaExtractor {
    fn kind(&self) -> FileKind {
        self.kind
    }

    async fn extract(&self, file: &UploadedFile) -> Result<String, ServiceError> {
        tracing::info!(
            file_name = %file.file_name,
            mime_type = %file.mime_type,
            size = file.data.len(),
            provider = self.provider.name(),
            "Extracting media content"
        );

        let attachment = Attachment {
            mime_type: file.mime_type.clone(),
            data: file.data.clone(),
        };

        let started = Instant::now();
        let result = self
            .provider
            .generate(self.prompt(), &[attachment], &GenerationParams::default())
            .await;
        metrics::record_ai_request("extraction", result.is_ok(), started.elapsed());

        let response = result?;
        metrics::record_ai_tokens("extraction", response.input_tokens, response.output_tokens);

        Ok(response.text.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextProvider;

    #[tokio::test]
    async fn returns_provider_text() {
        let extractor = MediaExtractor::image(Arc::new(MockTextProvider::with_response(
            "Photosynthesis converts light to chemical energy",
        )));
        let file = UploadedFile {
            file_name: "slide.png".into(),
            mime_type: "image/png".into(),
            data: vec![0x89, b'P', b'N', b'G'],
        };

        let text = extractor.extract(&file).await.unwrap();
        assert!(text.contains("Photosynthesis"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let extractor = MediaExtractor::video(Arc::new(MockTextProvider::new(false)));
        let file = UploadedFile {
            file_name: "lecture.mp4".into(),
            mime_type: "video/mp4".into(),
            data: vec![0; 8],
        };

        assert!(matches!(
            extractor.extract(&file).await,
            Err(ServiceError::Provider(_))
        ));
    }
}
