//! Violation vocabulary for the stream monitor (C9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    CanaryLeak,
    PiiDetected,
    SecretDetected,
    InjectionPayload,
    MarkdownInjection,
}

impl ViolationType {
    /// Whether this violation type terminates the downstream immediately
    /// (as opposed to being redactable, like `pii_detected`).
    pub fn terminates_by_default(self) -> bool {
        !matches!(self, ViolationType::PiiDetected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationType,
    pub label: String,
    pub matched: String,
}

impl Violation {
    pub fn new(kind: ViolationType, label: impl Into<String>, matched: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            matched: matched.into(),
        }
    }
}
