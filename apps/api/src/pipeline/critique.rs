//! Critique payload shapes returned by a feedback generator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ "message": { "content": ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub message: FeedbackMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub content: CritiqueContent,
}

/// Generators answer either with a bare string or with a list of content parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CritiqueContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    pub text: String,
}

#[cfg(test)]
impl FeedbackResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: FeedbackMessage {
                content: CritiqueContent::Text(content.into()),
            },
        }
    }
}

/// The critique text: the string itself, or the first part's text.
/// An empty part list yields `""`.
pub fn critique_text(content: &CritiqueContent) -> &str {
    match content {
        CritiqueContent::Text(text) => text,
        CritiqueContent::Parts(parts) => parts.first().map(|p| p.text.as_str()).unwrap_or(""),
    }
}

pub fn parse_critique(response: &FeedbackResponse) -> Result<Value, serde_json::Error> {
    serde_json::from_str(critique_text(&response.message.content))
}
