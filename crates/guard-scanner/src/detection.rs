//! Shared detection vocabulary used by every analyzer in this crate.
//!
//! A [`Detection`] is the atomic unit every signal (pattern match, entropy
//! spike, perplexity anomaly, script switch, trajectory drift) is reduced to
//! before [`crate::scanner`] fuses them into a composite [`crate::scanner::ScanResult`].

use serde::{Deserialize, Serialize};

/// Severity of an individual detection.
///
/// Severity drives two things: the weight contributed to the composite score
/// in C8, and the sensitivity gate in the pattern library (C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight contributed to the Input Scanner's composite score.
    pub const fn weight(self) -> f64 {
        match self {
            Severity::Low => 0.2,
            Severity::Medium => 0.4,
            Severity::High => 0.6,
            Severity::Critical => 1.0,
        }
    }
}

/// Closed taxonomy of detection kinds.
///
/// `Custom` carries a caller-supplied label for patterns registered outside
/// the built-in catalogue (C6 "custom user-supplied regex patterns").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    InstructionOverride,
    RoleManipulation,
    SkeletonKey,
    DelimiterEscape,
    EncodingAttack,
    AdversarialSuffix,
    PerplexityAnomaly,
    ManyShot,
    MultiLanguage,
    Virtualization,
    MarkdownInjection,
    IndirectInjection,
    ToolAbuse,
    DataExfiltration,
    PrivilegeEscalation,
    MemoryPoisoning,
    ChainInjection,
    HistoryManipulation,
    DenialOfWallet,
    LlmJudgeRejected,
    IntentMisalignment,
    EntropyAnomaly,
    SandwichViolation,
    IndirectToolInjection,
    ContextOverflow,
    CanaryLeak,
    Custom(String),
}

/// A single character-offset span within normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

/// One flagged signal, whether from a regex match or a synthesized anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "type")]
    pub kind: DetectionType,
    /// Name of the pattern or analyzer that produced this detection.
    pub pattern: String,
    /// The literal matched text (or a summary for synthetic detections).
    pub matched: String,
    pub severity: Severity,
    pub position: Position,
    pub description: String,
}

impl Detection {
    pub fn new(
        kind: DetectionType,
        pattern: impl Into<String>,
        matched: impl Into<String>,
        severity: Severity,
        position: Position,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            matched: matched.into(),
            severity,
            position,
            description: description.into(),
        }
    }

    pub fn is_high_or_critical(&self) -> bool {
        matches!(self.severity, Severity::High | Severity::Critical)
    }
}
