use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One analysis request and, once generated, its critique.
/// Stored as JSON under `resume:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    /// `None` until the critique is generated and parsed.
    pub feedback: Option<Value>,
}

impl AnalysisRecord {
    pub fn is_provisional(&self) -> bool {
        self.feedback.is_none()
    }
}
