use super::{Extractor, FileKind, UploadedFile};
use crate::services::ServiceError;
use async_trait::async_trait;

#[derive(Default)]
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Text
    }

    async fn extract(&self, file: &UploadedFile) -> Result<String, ServiceError> {
        Ok(String::from_utf8_lossy(&file.data).into_owned())
    }
}
