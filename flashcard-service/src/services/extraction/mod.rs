//! Turns uploaded study material into plain text.

pub mod executor;
pub mod media;
pub mod pdf;
pub mod text;

use crate::services::providers::TextProvider;
use crate::services::{metrics, ServiceError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use executor::CommandExecutor;
pub use media::MediaExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Video,
    Text,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Text => "text",
        }
    }

    /// Classify by MIME type, falling back to the file extension when the
    /// client sent a generic type.
    pub fn detect(mime_type: &str, file_name: &str) -> Option<Self> {
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/pdf" => return Some(FileKind::Pdf),
            m if m.starts_with("image/") => return Some(FileKind::Image),
            m if m.starts_with("video/") => return Some(FileKind::Video),
            m if m.starts_with("text/") => return Some(FileKind::Text),
            "" | "application/octet-stream" => {}
            _ => return None,
        }

        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "heic" => Some(FileKind::Image),
            "mp4" | "mov" | "webm" | "mpeg" | "avi" => Some(FileKind::Video),
            "txt" | "md" | "csv" => Some(FileKind::Text),
            _ => None,
        }
    }

    /// MIME type to send upstream when the client did not provide a usable one.
    fn guess_mime(file_name: &str) -> Option<&'static str> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        Some(match ext.as_str() {
            "pdf" => "application/pdf",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "mp4" => "video/mp4",
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mpeg" => "video/mpeg",
            "avi" => "video/x-msvideo",
            "md" => "text/markdown",
            "csv" => "text/csv",
            "txt" => "text/plain",
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait Extractor: Send + Sync {
    fn kind(&self) -> FileKind;

    async fn extract(&self, file: &UploadedFile) -> Result<String, ServiceError>;
}

/// Dispatches uploads to the extractor registered for their kind.
#[derive(Clone)]
pub struct ContentExtractor {
    extractors: Arc<Vec<Box<dyn Extractor>>>,
}

impl ContentExtractor {
    pub fn new(provider: Arc<dyn TextProvider>, command_timeout: Duration) -> Self {
        let executor = CommandExecutor::new(command_timeout);

        Self {
            extractors: Arc::new(vec![
                Box::new(PdfExtractor::new(executor)),
                Box::new(MediaExtractor::image(provider.clone())),
                Box::new(MediaExtractor::video(provider)),
                Box::new(TextExtractor),
            ]),
        }
    }

    fn find(&self, kind: FileKind) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.kind() == kind)
            .map(|b| b.as_ref())
    }

    pub async fn extract(&self, mut file: UploadedFile) -> Result<String, ServiceError> {
        let kind = FileKind::detect(&file.mime_type, &file.file_name)
            .ok_or(ServiceError::UnsupportedFileType)?;
        let extractor = self.find(kind).ok_or(ServiceError::UnsupportedFileType)?;

        if !file.mime_type.contains('/') || file.mime_type == "application/octet-stream" {
            if let Some(guessed) = FileKind::guess_mime(&file.file_name) {
                file.mime_type = guessed.to_string();
            }
        }

        let result = extractor.extract(&file).await;
        metrics::record_extraction(kind.as_str(), result.is_ok());

        let content = result?;
        let content = content.trim();
        if content.is_empty() {
            tracing::warn!(file_name = %file.file_name, kind = kind.as_str(), "Extraction produced no text");
            return Err(ServiceError::EmptyContent);
        }

        tracing::info!(
            file_name = %file.file_name,
            kind = kind.as_str(),
            content_length = content.len(),
            "Content extracted"
        );

        Ok(content.to_string())
    }
}
