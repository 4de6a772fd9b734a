//! Upload-and-analyze pipeline.
//!
//! Flow: validate → upload original → rasterise → upload image →
//!       provisional write → feedback → parse → final write.
//!
//! Steps run strictly in order on one task. Nothing is rolled back: a failure
//! after the provisional write leaves a feedback-less record under
//! `resume:<id>`, which is the recoverable partial state.

use std::slice;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::clients::{BlobStore, ClientError, FeedbackGenerator, KvStore, Rasterizer};
use crate::models::record::AnalysisRecord;
use crate::pipeline::critique::parse_critique;
use crate::pipeline::id::{generate_id, record_key};
use crate::pipeline::prompts::prepare_instructions;
use crate::pipeline::status::{PipelineState, StatusTracker};
use crate::pipeline::validation::{validate, AnalyzeRequest, ValidatedRequest, ValidationError};

/// Outcome of a failed analysis. Display text is the user-facing narrative.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("An analysis is already in progress")]
    InProgress,

    #[error("Failed to upload file")]
    UploadFile(#[source] Option<ClientError>),

    #[error("Failed to convert document to image")]
    Convert(#[source] Option<ClientError>),

    #[error("Failed to upload image")]
    UploadImage(#[source] Option<ClientError>),

    #[error("Failed to save analysis record")]
    Persist(#[source] Option<ClientError>),

    #[error("Failed to analyze document")]
    Analyze(#[source] Option<ClientError>),

    /// The critique was not valid JSON. Not tied to a single step.
    #[error("Something went wrong")]
    Parse(#[source] serde_json::Error),
}

/// Lifts `Result<Option<T>, ClientError>` into the step's error variant;
/// both an error and an empty answer count as failure.
fn require<T>(
    result: Result<Option<T>, ClientError>,
    variant: fn(Option<ClientError>) -> AnalyzeError,
) -> Result<T, AnalyzeError> {
    match result {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(variant(None)),
        Err(e) => Err(variant(Some(e))),
    }
}

pub struct Analyzer {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn KvStore>,
    rasterizer: Arc<dyn Rasterizer>,
    feedback: Arc<dyn FeedbackGenerator>,
}

impl Analyzer {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn KvStore>,
        rasterizer: Arc<dyn Rasterizer>,
        feedback: Arc<dyn FeedbackGenerator>,
    ) -> Self {
        Self {
            blobs,
            records,
            rasterizer,
            feedback,
        }
    }

    /// Runs one analysis and returns the new record's id.
    ///
    /// Validation happens before `status` is touched and before any external
    /// call. A tracker that already has a run in flight is refused with
    /// `InProgress`. Every other failure leaves `status` in `Failed` carrying
    /// the error's message.
    pub async fn analyze(
        &self,
        request: AnalyzeRequest,
        status: &StatusTracker,
    ) -> Result<String, AnalyzeError> {
        let request = validate(request)?;
        status.try_begin().map_err(|_| AnalyzeError::InProgress)?;

        match self.run(request, status).await {
            Ok(id) => {
                status.advance(PipelineState::Done);
                info!("Analysis {id} complete");
                Ok(id)
            }
            Err(err) => {
                match &err {
                    AnalyzeError::Parse(e) => error!("Critique could not be parsed: {e}"),
                    other => warn!("Analysis aborted: {other} ({:?})", std::error::Error::source(other)),
                }
                status.fail(err.to_string());
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        request: ValidatedRequest,
        status: &StatusTracker,
    ) -> Result<String, AnalyzeError> {
        let ValidatedRequest {
            company_name,
            job_title,
            job_description,
            file,
        } = request;

        // Uploading: entered by try_begin
        let resume = require(
            self.blobs.upload(slice::from_ref(&file)).await,
            AnalyzeError::UploadFile,
        )?;
        info!("Uploaded {} as {}", file.name, resume.path);

        status.advance(PipelineState::Converting);
        let image = require(self.rasterizer.rasterize(&file).await, AnalyzeError::Convert)?;

        status.advance(PipelineState::UploadingImage);
        let image = require(
            self.blobs.upload(slice::from_ref(&image)).await,
            AnalyzeError::UploadImage,
        )?;

        status.advance(PipelineState::Persisting);
        let id = generate_id();
        let key = record_key(&id);
        let mut record = AnalysisRecord {
            id: id.clone(),
            resume_path: resume.path,
            image_path: image.path,
            company_name,
            job_title,
            job_description,
            feedback: None,
        };
        self.store(&key, &record).await?;
        info!("Stored provisional record {key}");

        status.advance(PipelineState::Analyzing);
        let instructions = prepare_instructions(&record.job_title, &record.job_description);
        let response = require(
            self.feedback.feedback(&record.resume_path, &instructions).await,
            AnalyzeError::Analyze,
        )?;

        status.advance(PipelineState::Finalizing);
        record.feedback = Some(parse_critique(&response).map_err(AnalyzeError::Parse)?);
        self.store(&key, &record).await?;
        info!("Stored final record {key}");

        Ok(id)
    }

    /// A rejected write (`set` returning false) is a failure like any other.
    async fn store(&self, key: &str, record: &AnalysisRecord) -> Result<(), AnalyzeError> {
        let value = serde_json::to_string(record)
            .map_err(|e| AnalyzeError::Persist(Some(ClientError::Json(e))))?;
        match self.records.set(key, &value).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AnalyzeError::Persist(None)),
            Err(e) => Err(AnalyzeError::Persist(Some(e))),
        }
    }
}
