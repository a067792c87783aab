//! Error type for the injected judge LLM call. `LLMJudge::evaluate`
//! itself never propagates an error — a failed or malformed call
//! degrades to a `flagged` verdict — this only exists so the `LlmCall`
//! trait has something concrete to return.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge LLM call failed: {0}")]
    CallFailed(String),
}
