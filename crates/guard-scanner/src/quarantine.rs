//! # Quarantine (C1)
//!
//! A typed wrapper that carries provenance and an inferred risk level for any
//! value crossing a trust boundary, and refuses to hand that value back out
//! without an explicit, named reason.
//!
//! ## Rationale
//!
//! Forcing every unwrap to name a reason turns each trust-boundary crossing
//! into an audit hook point: a reviewer can grep for `unwrap(` call sites and
//! read, in plain language, why untrusted content was allowed to flow
//! further into the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Where a piece of content originated.
///
/// Risk is inferred from the source unless the caller overrides it at
/// construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    UserInput,
    ApiResponse,
    WebContent,
    Email,
    FileUpload,
    Database,
    RagRetrieval,
    ToolOutput,
    McpToolOutput,
    ModelOutput,
    Unknown,
}

impl ContentSource {
    /// Default risk level for content from this source, per the data model.
    pub const fn default_risk(self) -> RiskLevel {
        match self {
            ContentSource::UserInput
            | ContentSource::Email
            | ContentSource::WebContent
            | ContentSource::Unknown => RiskLevel::High,
            ContentSource::ApiResponse
            | ContentSource::ToolOutput
            | ContentSource::McpToolOutput
            | ContentSource::ModelOutput => RiskLevel::Medium,
            ContentSource::Database | ContentSource::RagRetrieval | ContentSource::FileUpload => {
                RiskLevel::Low
            }
        }
    }
}

/// Coarse risk classification attached to quarantined content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Errors raised by quarantine operations.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// `unwrap` was called with an empty reason string.
    #[error("unwrap reason must not be empty")]
    InvalidUnwrapReason,
}

/// An immutable wrapper around untrusted content.
///
/// Construction is the only way to set `value`; there is no `DerefMut`, no
/// `From<Quarantined<T>> for T`, and no `Deref<Target = T>` impl — any of
/// those would let callers treat quarantined content as trusted by
/// accident. The only way out is [`unwrap`](Quarantined::unwrap), which
/// demands a reason.
#[derive(Debug, Clone)]
pub struct Quarantined<T> {
    value: T,
    source: ContentSource,
    risk: RiskLevel,
    id: Uuid,
    timestamp: u64,
}

impl<T> Quarantined<T> {
    /// Wrap a value with its provenance. `risk` overrides the source's
    /// default risk level when provided.
    pub fn wrap(value: T, source: ContentSource, risk: Option<RiskLevel>) -> Self {
        Self {
            value,
            source,
            risk: risk.unwrap_or_else(|| source.default_risk()),
            id: Uuid::new_v4(),
            timestamp: now_unix_millis(),
        }
    }

    pub fn source(&self) -> ContentSource {
        self.source
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Explicitly cross the trust boundary. `reason` must be non-empty and
    /// exists purely as an audit artifact: it is not validated beyond that.
    pub fn unwrap(self, reason: &str) -> Result<T, QuarantineError> {
        if reason.trim().is_empty() {
            return Err(QuarantineError::InvalidUnwrapReason);
        }
        Ok(self.value)
    }

    /// Borrow the inner value without consuming the wrapper, still demanding
    /// a reason so call sites stay self-documenting.
    pub fn peek(&self, reason: &str) -> Result<&T, QuarantineError> {
        if reason.trim().is_empty() {
            return Err(QuarantineError::InvalidUnwrapReason);
        }
        Ok(&self.value)
    }
}

/// Returns true for any `Quarantined<_>` value. Exists mainly so generic
/// call sites can branch on "is this thing wrapped" without type-level
/// gymnastics; in Rust the type system already prevents accidental misuse,
/// but downstream glue code (e.g. dynamic dispatch over `dyn Any`) wants a
/// runtime check too.
pub fn is_quarantined<T>(_: &Quarantined<T>) -> bool {
    true
}

fn now_unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
