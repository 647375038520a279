//! Unified error type for prop-gem.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Odds API error: {0}")]
    OddsApi(String),

    #[error("LLM API error (status={status}): {message}")]
    Llm { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("{0}")]
    Other(String),
}
