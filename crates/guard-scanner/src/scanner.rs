//! # Input Scanner (C8)
//!
//! Fuses every signal produced by C2-C7 into a single composite
//! [`ScanResult`]. This is the one entry point the rest of the workspace
//! calls into for text scanning; [`crate::multimodal`] and guard-stream both
//! build on top of it rather than re-implementing signal fusion.

use serde::{Deserialize, Serialize};

use crate::detection::{Detection, DetectionType, Position, Severity};
use crate::entropy;
use crate::language::{self, Script};
use crate::normalize;
use crate::patterns::{PatternLibrary, Sensitivity};
use crate::perplexity;
use crate::quarantine::Quarantined;
use crate::trajectory::{self, TrajectoryResult};

pub const SAFE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScannerConfig {
    pub sensitivity: Sensitivity,
    pub check_entropy: bool,
    pub check_perplexity: bool,
    pub check_language: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::Balanced,
            check_entropy: true,
            check_perplexity: true,
            check_language: true,
        }
    }
}

/// Composite result of scanning one piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub safe: bool,
    pub score: f64,
    pub detections: Vec<Detection>,
    pub normalized: String,
    pub language: Option<Script>,
    pub entropy: f64,
    pub perplexity: Option<f64>,
}

/// Owns the compiled pattern catalogue plus scan configuration. Cheap to
/// construct; holds no session state (the facade owns that).
pub struct InputScanner {
    config: ScannerConfig,
    patterns: PatternLibrary,
}

impl InputScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            patterns: PatternLibrary::new(),
        }
    }

    pub fn register_custom_pattern(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
    ) -> Result<(), regex::Error> {
        self.patterns.register_custom(name, pattern)
    }

    /// Scan quarantined text, producing a composite [`ScanResult`].
    pub fn scan(&self, q: &Quarantined<String>) -> ScanResult {
        let raw = q.peek("input scanning").expect("peek reason is non-empty");
        self.scan_text(raw)
    }

    /// Scan a raw string directly (used by C9/C11/C18, which wrap their own
    /// provenance before or after scanning).
    pub fn scan_text(&self, raw: &str) -> ScanResult {
        let normalized = normalize::normalize(raw);
        let mut detections = self.patterns.scan(&normalized, self.config.sensitivity);

        let entropy_result = entropy::analyze_default(&normalized);
        if self.config.check_entropy && entropy_result.anomalous {
            detections.push(synthetic_detection(
                DetectionType::EntropyAnomaly,
                "entropy-analyzer",
                &normalized,
                Severity::Medium,
                "Shannon entropy exceeded the anomaly threshold",
            ));
        }

        let perplexity_result = if self.config.check_perplexity {
            let result = perplexity::analyze_default(&normalized);
            if result.anomalous {
                detections.push(synthetic_detection(
                    DetectionType::PerplexityAnomaly,
                    "perplexity-analyzer",
                    &normalized,
                    Severity::Medium,
                    "n-gram perplexity exceeded the anomaly threshold",
                ));
            }
            Some(result.perplexity)
        } else {
            None
        };

        let language_result = language::analyze(&normalized);
        if self.config.check_language && language_result.switches.len() > 1 {
            detections.push(synthetic_detection(
                DetectionType::MultiLanguage,
                "language-detector",
                &normalized,
                Severity::Low,
                "multiple script switches detected within a single message",
            ));
        }

        let score = composite_score(&detections);
        let has_high_or_critical = detections.iter().any(Detection::is_high_or_critical);
        let safe = score < SAFE_THRESHOLD && !has_high_or_critical;

        ScanResult {
            safe,
            score,
            detections,
            normalized,
            language: language_result.primary,
            entropy: entropy_result.mean,
            perplexity: perplexity_result,
        }
    }

    /// Delegates to the trajectory analyzer (C7) over the user-role
    /// subsequence of a conversation.
    pub fn analyze_trajectory(&self, messages: &[&str]) -> TrajectoryResult {
        trajectory::analyze_default(messages)
    }
}

fn synthetic_detection(
    kind: DetectionType,
    pattern: &str,
    text: &str,
    severity: Severity,
    description: &str,
) -> Detection {
    Detection::new(
        kind,
        pattern,
        text.chars().take(80).collect::<String>(),
        severity,
        Position {
            start: 0,
            end: text.len(),
        },
        description,
    )
}

/// `clamp(Σ weight(severity), 0, 1)`, with any critical detection
/// saturating the score to 1.0. Position decay is 1.0 in this spec.
fn composite_score(detections: &[Detection]) -> f64 {
    if detections.iter().any(|d| d.severity == Severity::Critical) {
        return 1.0;
    }
    let sum: f64 = detections.iter().map(|d| d.severity.weight()).sum();
    sum.clamp(0.0, 1.0)
}
