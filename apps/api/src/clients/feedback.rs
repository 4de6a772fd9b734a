//! Claude-backed feedback generator.
//!
//! The stored original is fetched back from the blob store and attached as a
//! base64 PDF document block, so the model reads the same bytes that were
//! persisted under `document_path`.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info};

use crate::clients::{BlobStore, ClientError, FeedbackGenerator, PDF_MEDIA_TYPE};
use crate::llm_client::{strip_json_fences, LlmClient, LlmResponse};
use crate::pipeline::critique::{ContentPart, CritiqueContent, FeedbackMessage, FeedbackResponse};
use crate::pipeline::prompts::FEEDBACK_SYSTEM;

pub struct AnthropicFeedbackGenerator {
    llm: LlmClient,
    blobs: Arc<dyn BlobStore>,
}

impl AnthropicFeedbackGenerator {
    pub fn new(llm: LlmClient, blobs: Arc<dyn BlobStore>) -> Self {
        Self { llm, blobs }
    }
}

#[async_trait]
impl FeedbackGenerator for AnthropicFeedbackGenerator {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<Option<FeedbackResponse>, ClientError> {
        let document = self.blobs.download(document_path).await?;
        let encoded = STANDARD.encode(&document);
        debug!(
            "Sending {document_path} for review ({} bytes, {} base64)",
            document.len(),
            encoded.len()
        );

        let response = self
            .llm
            .call_with_document(&encoded, PDF_MEDIA_TYPE, instructions, FEEDBACK_SYSTEM)
            .await?;

        let feedback = feedback_from(&response);
        if feedback.is_some() {
            info!(
                "Feedback received for {document_path}: output_tokens={}",
                response.usage.output_tokens
            );
        }
        Ok(feedback)
    }
}

/// Text blocks become `Parts`, fences stripped. `None` when the model returned no text.
fn feedback_from(response: &LlmResponse) -> Option<FeedbackResponse> {
    let parts: Vec<ContentPart> = response
        .texts()
        .map(|text| ContentPart {
            text: strip_json_fences(text).to_string(),
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    Some(FeedbackResponse {
        message: FeedbackMessage {
            content: CritiqueContent::Parts(parts),
        },
    })
}
