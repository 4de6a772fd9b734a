//! Pure guard run before any side effect of an analysis.

use thiserror::Error;

use crate::clients::FileBlob;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in the {0}")]
    MissingField(&'static str),

    #[error("Please upload a resume")]
    MissingFile,

    #[error("Please upload a PDF file (got {0:?})")]
    NotPdf(String),
}

/// Raw form input for one analysis.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: Option<FileBlob>,
}

/// Input that passed validation; text fields are trimmed.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: FileBlob,
}

pub fn validate(request: AnalyzeRequest) -> Result<ValidatedRequest, ValidationError> {
    let company_name = required(&request.company_name, "company name")?;
    let job_title = required(&request.job_title, "job title")?;
    let job_description = required(&request.job_description, "job description")?;

    let file = request.file.ok_or(ValidationError::MissingFile)?;
    if !file.is_pdf() {
        return Err(ValidationError::NotPdf(file.content_type));
    }

    Ok(ValidatedRequest {
        company_name,
        job_title,
        job_description,
        file,
    })
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}
