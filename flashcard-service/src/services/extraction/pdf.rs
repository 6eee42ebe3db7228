use super::{executor::CommandExecutor, Extractor, FileKind, UploadedFile};
use crate::services::ServiceError;
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Extracts text with poppler's `pdftotext`.
pub struct PdfExtractor {
    executor: CommandExecutor,
}

impl PdfExtractor {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

/// Temp file removed on drop, also on early return.
struct StagedFile(PathBuf);

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            tracing::warn!(path = ?self.0, error = %e, "Failed to remove staged upload");
        }
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Pdf
    }

    async fn extract(&self, file: &UploadedFile) -> Result<String, ServiceError> {
        let path = std::env::temp_dir().join(format!("flashcards-{}.pdf", Uuid::new_v4()));
        tokio::fs::write(&path, &file.data)
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to stage PDF: {}", e)))?;
        let staged = StagedFile(path);

        tracing::info!(file_name = %file.file_name, size = file.data.len(), "Extracting PDF text");

        let output = self
            .executor
            .execute_on("pdftotext", &staged.0, &["-"])
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e.to_string())))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
