//! Error types shared by the sandbox extractor, alerting engine, audit
//! bus, and auto-retry handler.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpsError>;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("extraction failed after exhausting retries: {cause}")]
    ExtractionFailed { cause: String },

    #[error("extractor LLM call failed: {0}")]
    LlmCallFailed(String),
}
