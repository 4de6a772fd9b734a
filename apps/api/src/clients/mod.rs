//! Boundary contracts for the external services the analysis pipeline drives.
//!
//! Every collaborator is a trait object injected into `Analyzer`, so the
//! pipeline never reaches for a process-wide client. Concrete adapters live in
//! the submodules; tests substitute recording fakes.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::pipeline::critique::FeedbackResponse;

pub mod blob;
pub mod feedback;
pub mod kv;
pub mod rasterizer;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// A named binary payload with its declared media type.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .map(|t| t.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
            .unwrap_or(false)
    }
}

/// Stable reference to an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm_client::LlmError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads the given files. `None` means the store accepted nothing.
    async fn upload(&self, files: &[FileBlob]) -> Result<Option<UploadedFile>, ClientError>;

    async fn download(&self, path: &str) -> Result<Bytes, ClientError>;
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns whether the store acknowledged the write.
    async fn set(&self, key: &str, value: &str) -> Result<bool, ClientError>;

    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;

    /// Values of every key starting with `prefix`, in no particular order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ClientError>;
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Renders the document to an image. `None` means no output was produced.
    async fn rasterize(&self, document: &FileBlob) -> Result<Option<FileBlob>, ClientError>;
}

#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Critiques the stored document at `document_path`. `None` means no answer.
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<Option<FeedbackResponse>, ClientError>;
}
