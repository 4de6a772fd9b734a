//! Axum route handlers for the analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use tracing::info;

use crate::auth::Session;
use crate::clients::FileBlob;
use crate::errors::AppError;
use crate::models::record::AnalysisRecord;
use crate::pipeline::records::{list_records, load_record};
use crate::pipeline::status::PipelineStatus;
use crate::pipeline::validation::AnalyzeRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub id: String,
}

/// POST /api/v1/resumes/analyze
///
/// Multipart fields: `company_name`, `job_title`, `job_description`, `file`.
/// The run is spawned onto its own task: if the client goes away mid-flight,
/// calls already issued still complete and the record is still written.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request = read_form(multipart).await?;
    let tracker = state.status.tracker(&session.subject);
    let analyzer = state.analyzer.clone();

    info!("Analysis requested by {}", session.subject);
    let id = tokio::spawn(async move { analyzer.analyze(request, &tracker).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("analysis task failed: {e}")))??;

    Ok(Json(AnalyzeResponse { id }))
}

/// GET /api/v1/resumes/analyze/status
pub async fn handle_analyze_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Json<PipelineStatus> {
    Json(state.status.tracker(&session.subject).current())
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisRecord>, AppError> {
    load_record(state.records.as_ref(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// GET /api/v1/resumes
pub async fn handle_list_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisRecord>>, AppError> {
    Ok(Json(list_records(state.records.as_ref()).await?))
}

/// Collects the form. Missing text fields become empty strings so validation
/// reports them; unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<AnalyzeRequest, AppError> {
    let mut request = AnalyzeRequest {
        company_name: String::new(),
        job_title: String::new(),
        job_description: String::new(),
        file: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, "Malformed form data"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "company_name" | "job_title" | "job_description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| form_error(e, &format!("Unreadable field {name}")))?;
                match name.as_str() {
                    "company_name" => request.company_name = value,
                    "job_title" => request.job_title = value,
                    _ => request.job_description = value,
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| form_error(e, "Unreadable file"))?;
                if !data.is_empty() {
                    request.file = Some(FileBlob::new(file_name, content_type, data));
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

/// A body over the route's limit surfaces as a multipart error with status 413.
fn form_error(err: MultipartError, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("{context}: {err}"))
    }
}
