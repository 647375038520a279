use common::EstimatorOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("API key not configured")]
    NotConfigured,
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Timeout")]
    Timeout,
    #[error("Empty completion")]
    EmptyResponse,
}

impl ChatError {
    /// Tag a failed call. A body that arrived but could not be read as a
    /// completion is a parse failure; everything else is transport.
    pub fn into_outcome<T>(self) -> EstimatorOutcome<T> {
        match self {
            Self::JsonError(_) | Self::EmptyResponse => {
                EstimatorOutcome::ParseFailure(self.to_string())
            }
            other => EstimatorOutcome::TransportFailure(other.to_string()),
        }
    }
}

/// Decode a chat-completions body and take the first non-blank message.
pub fn decode_completion(body: &str) -> Result<String, ChatError> {
    let resp: ChatResponse = serde_json::from_str(body)?;
    resp.first_content()
        .map(str::to_string)
        .ok_or(ChatError::EmptyResponse)
}

impl From<ChatError> for common::Error {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::HttpStatus { status, body } => common::Error::Llm { status, message: body },
            ChatError::JsonError(e) => common::Error::Json(e),
            ChatError::Timeout => common::Error::Timeout,
            other => common::Error::Llm {
                status: 0,
                message: other.to_string(),
            },
        }
    }
}
