//! S3 / MinIO-backed blob store.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::clients::{BlobStore, ClientError, FileBlob, UploadedFile};

#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, files: &[FileBlob]) -> Result<Option<UploadedFile>, ClientError> {
        // Multi-file uploads report the last stored path; this service always sends one.
        let mut uploaded = None;
        for file in files {
            let key = object_key(Uuid::new_v4(), &file.name);
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .body(ByteStream::from(file.data.to_vec()))
                .content_type(&file.content_type)
                .send()
                .await
                .map_err(|e| ClientError::S3(format!("upload failed: {}", DisplayErrorContext(e))))?;

            info!(
                "Uploaded {} ({} bytes) to s3://{}/{}",
                file.name,
                file.data.len(),
                self.bucket,
                key
            );
            uploaded = Some(UploadedFile { path: key });
        }
        Ok(uploaded)
    }

    async fn download(&self, path: &str) -> Result<Bytes, ClientError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| ClientError::S3(format!("download failed: {}", DisplayErrorContext(e))))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| ClientError::S3(format!("reading {path} failed: {e}")))?;
        Ok(data.into_bytes())
    }
}

/// Builds `uploads/<id>/<name>` with the name reduced to a safe character set.
fn object_key(id: Uuid, file_name: &str) -> String {
    let name: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = name.trim_matches('.');
    let name = if name.is_empty() { "file" } else { name };
    format!("uploads/{id}/{name}")
}
