//! # Stream Monitor (C9)
//!
//! A text→text transform that passes chunks through immediately on the
//! happy path and concurrently scans for violations. Unlike a naive
//! per-chunk scan, it withholds the trailing `overlap` characters of every
//! chunk until the next chunk arrives (or the stream ends), so a pattern
//! split across a chunk boundary is still caught before any of its bytes
//! reach the downstream consumer.
//!
//! Grounded in the same "evaluate chunk, hold or cut" shape as a
//! text-streaming gate: push a chunk, get back a decision, and a pending
//! violation always wins over further emission.

use guard_scanner::patterns::{PatternLibrary, Sensitivity};
use guard_scanner::DetectionType;
use tracing::warn;

use crate::pii;
use crate::secrets;
use crate::violation::{Violation, ViolationType};

pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Output grouping only; does not change scanning correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    Sentence,
    Tokens,
    Fixed,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub canaries: Vec<String>,
    pub pii_redaction: bool,
    pub chunk_size: usize,
    pub chunk_strategy: ChunkStrategy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            canaries: Vec::new(),
            pii_redaction: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_strategy: ChunkStrategy::Fixed,
        }
    }
}

/// What to do with the text produced by a `push`/`finish` call.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// Safe to forward to the downstream consumer.
    Emit(String),
    /// A violation fired; the stream is terminated and no further bytes
    /// (including anything still held back) will ever be emitted.
    Terminated(Violation),
}

/// Longest pattern the monitor needs to guard against spanning a chunk
/// boundary: the longest configured canary, or a conservative default for
/// regex-based detectors that don't have a fixed length.
fn max_pattern_len(canaries: &[String]) -> usize {
    const REGEX_PATTERN_MARGIN: usize = 40;
    canaries
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0)
        .max(REGEX_PATTERN_MARGIN)
}

pub struct StreamMonitor {
    config: StreamConfig,
    patterns: PatternLibrary,
    held: String,
    terminated: bool,
    overlap: usize,
}

impl StreamMonitor {
    pub fn new(config: StreamConfig) -> Self {
        let overlap = max_pattern_len(&config.canaries) + config.chunk_size;
        Self {
            config,
            patterns: PatternLibrary::new(),
            held: String::new(),
            terminated: false,
            overlap,
        }
    }

    /// Scan `text` for every violation family, canary first.
    fn detect(&self, text: &str) -> Vec<Violation> {
        let mut hits = Vec::new();

        for canary in &self.config.canaries {
            if !canary.is_empty() && text.contains(canary.as_str()) {
                hits.push(Violation::new(ViolationType::CanaryLeak, "canary", canary.clone()));
            }
        }

        hits.extend(secrets::scan(text));

        for detection in self.patterns.scan(text, Sensitivity::Balanced) {
            let kind = match detection.kind {
                DetectionType::MarkdownInjection => ViolationType::MarkdownInjection,
                _ if detection.is_high_or_critical() => ViolationType::InjectionPayload,
                _ => continue,
            };
            hits.push(Violation::new(kind, detection.pattern.clone(), detection.matched.clone()));
        }

        hits.extend(pii::scan(text));

        hits
    }

    /// Push the next chunk of model output through the monitor.
    pub fn push(&mut self, chunk: &str) -> StreamOutcome {
        if self.terminated {
            return StreamOutcome::Terminated(Violation::new(
                ViolationType::CanaryLeak,
                "stream-already-terminated",
                "",
            ));
        }

        let combined = format!("{}{}", self.held, chunk);
        self.scan_and_advance(combined, false)
    }

    /// Flush whatever is still held back at end-of-stream.
    pub fn finish(&mut self) -> StreamOutcome {
        if self.terminated {
            return StreamOutcome::Emit(String::new());
        }
        let combined = std::mem::take(&mut self.held);
        self.scan_and_advance(combined, true)
    }

    fn scan_and_advance(&mut self, combined: String, is_final: bool) -> StreamOutcome {
        let violations = self.detect(&combined);

        if let Some(terminating) = violations
            .iter()
            .find(|v| v.kind.terminates_by_default())
        {
            warn!(kind = ?terminating.kind, label = %terminating.label, "stream monitor terminating downstream");
            self.terminated = true;
            self.held.clear();
            return StreamOutcome::Terminated(terminating.clone());
        }

        let pii_hits: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.kind == ViolationType::PiiDetected)
            .collect();

        if !pii_hits.is_empty() && !self.config.pii_redaction {
            warn!(label = %pii_hits[0].label, "stream monitor terminating downstream: PII redaction disabled");
            self.terminated = true;
            self.held.clear();
            return StreamOutcome::Terminated(pii_hits[0].clone());
        }

        let redacted = if pii_hits.is_empty() {
            combined
        } else {
            redact(&combined, &pii_hits)
        };

        if is_final {
            return StreamOutcome::Emit(redacted);
        }

        let chars: Vec<char> = redacted.chars().collect();
        if chars.len() <= self.overlap {
            self.held = redacted;
            return StreamOutcome::Emit(String::new());
        }

        let split_at = chars.len() - self.overlap;
        let to_emit: String = chars[..split_at].iter().collect();
        let to_hold: String = chars[split_at..].iter().collect();
        self.held = to_hold;
        StreamOutcome::Emit(to_emit)
    }
}

fn redact(text: &str, hits: &[&Violation]) -> String {
    let mut out = text.to_string();
    for hit in hits {
        let label = format!("[REDACTED-{}]", hit.label.to_uppercase());
        out = out.replacen(&hit.matched, &label, 1);
    }
    out
}
