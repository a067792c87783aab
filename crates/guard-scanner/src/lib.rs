//! # Multi-Signal Input Scanning
//!
//! This crate is the first line of defense in the guard pipeline. It
//! operates on raw text (and, via [`multimodal`], on extracted media text)
//! before anything reaches a model or a tool call.
//!
//! ## Purpose
//!
//! 1. **Quarantine** — a typed wrapper that carries provenance for any
//!    value crossing a trust boundary and refuses implicit coercion back
//!    to its underlying type.
//! 2. **Normalization** — strips invisible characters, homoglyphs, HTML
//!    entity escaping, and opportunistic base64 wrapping before any other
//!    signal runs, so later stages see the attacker's actual text.
//! 3. **Multi-signal detection** — entropy, n-gram perplexity, script
//!    switching, regex pattern matching, and cross-turn trajectory drift,
//!    fused into a single composite score.
//!
//! ## Threat model
//!
//! | Threat | Description | Defense |
//! |--------|-------------|---------|
//! | Direct injection | "Ignore previous instructions" attacks | Pattern matching (C6) |
//! | Obfuscated injection | Zero-width/homoglyph/HTML-entity smuggling | Normalizer (C2) |
//! | GCG-style suffixes | Adversarial gradient-optimized suffixes | Entropy + perplexity (C3/C4) |
//! | Jailbreaks | DAN, role-play, mode-switching | Pattern + heuristics |
//! | Multi-turn escalation | Risk keywords building across turns | Trajectory analyzer (C7) |
//! | Script smuggling | Payload written in an unexpected script | Language detector (C5) |
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        INPUT SCANNER (C8)                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │  Quarantined<String>                                          │
//! │        │                                                      │
//! │        ▼                                                      │
//! │  normalize (C2) ──► pattern library (C6) ──► detections       │
//! │        │                                                      │
//! │        ├──► entropy (C3) ───────► synthetic detection         │
//! │        ├──► perplexity (C4) ────► synthetic detection         │
//! │        └──► language (C5) ──────► synthetic detection         │
//! │                                                                │
//! │        composite score = clamp(Σ weight(severity), 0, 1)      │
//! │        safe = score < 0.5 ∧ no high/critical detection         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References
//!
//! - **Zou et al. (2023)** — "Universal and Transferable Adversarial Attacks
//!   on Aligned Language Models." <https://arxiv.org/abs/2307.15043>
//! - **Greshake et al. (2023)** — "Not What You've Signed Up For:
//!   Compromising Real-World LLM-Integrated Applications with Indirect
//!   Prompt Injection." <https://arxiv.org/abs/2302.12173>
//! - **Perez & Ribeiro (2022)** — "Ignore This Title and HackAPrompt."
//!   <https://arxiv.org/abs/2311.16119>
//! - **Alon & Kamfonas (2023)** — "Detecting Language Model Attacks with
//!   Perplexity." <https://arxiv.org/abs/2308.14132>
//! - **OWASP LLM Top 10.**
//!   <https://owasp.org/www-project-top-10-for-large-language-model-applications/>

pub mod detection;
pub mod entropy;
pub mod error;
pub mod language;
pub mod multimodal;
pub mod normalize;
pub mod patterns;
pub mod perplexity;
pub mod quarantine;
pub mod scanner;
pub mod trajectory;

pub use detection::{Detection, DetectionType, Position, Severity};
pub use error::{Result, ScannerError};
pub use multimodal::{
    ExtractedContent, MediaExtractor, MediaScanResult, MediaType, MultiModalConfig,
    MultiModalScanner,
};
pub use patterns::{PatternLibrary, Sensitivity};
pub use quarantine::{ContentSource, Quarantined, QuarantineError, RiskLevel};
pub use scanner::{InputScanner, ScanResult, ScannerConfig};
pub use trajectory::TrajectoryResult;
