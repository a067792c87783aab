//! # Guard Core
//!
//! The session-scoped Facade that glues every other crate in this
//! workspace into the handful of operations a host application actually
//! calls: `guard_input`, `create_stream_transform`, `guard_chain_step`,
//! `judge_output`, `scan_media`, plus direct access to the Action
//! Validator and the HMAC integrity chain.
//!
//! ## Threat coverage
//!
//! | Layer | Component | Threats blocked |
//! |-------|-----------|-----------------|
//! | Input | `guard-scanner` (C1-C9, C18) | Prompt injection, obfuscation, multi-turn escalation, malicious media |
//! | Output | `guard-stream` (C9) | Canary/PII leakage across streamed chunks |
//! | Action | `guard-action` (C10, C11) | Policy violations, rate abuse, exfiltration, loop-accumulated risk |
//! | Integrity | `guard-integrity` (C12) | Post-hoc tampering with stored conversations |
//! | Ops | `guard-ops` (C13, C14, C16, C17) | Unstructured extraction, alert fatigue, retry-without-signal |
//! | Judgment | `guard-judge` (C19) | Subtle policy violations a pattern scan misses |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GUARD FACADE (C15)                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                                │
//! │                    ┌─────────────────┐                        │
//! │                    │   GuardFacade   │  ← session state       │
//! │                    └────────┬────────┘                        │
//! │                             │                                 │
//! │   ┌──────────┬──────────┬───┴────┬───────────┬───────────┐    │
//! │   ▼          ▼          ▼        ▼           ▼           ▼    │
//! │ scanner   stream     action   integrity     ops        judge  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guard_core::{GuardConfig, GuardFacade, Message, Role};
//!
//! let mut facade = GuardFacade::new(GuardConfig::default(), "session-secret")?;
//! let messages = vec![Message::new(Role::User, "what's the weather?")];
//! let safe = facade.guard_input(&messages, None)?;
//! ```
//!
//! ## Security notes
//!
//! - A blocked input never silently passes; the active recovery mode
//!   decides what happens next, and every mode other than `continue`
//!   leaves an audit trail.
//! - `SessionState` is owned exclusively by the facade; no component
//!   mutates it directly.
//! - Once a session is quarantined it never recovers — construct a new
//!   facade to continue.

mod config;
mod error;
mod facade;
mod message;
mod recovery;
mod session;

pub use config::{GlobalConfig, GuardConfig, RecoveryConfig, ScanStrategy};
pub use error::{GuardError, Result};
pub use facade::GuardFacade;
pub use message::{Message, Role};
pub use recovery::RecoveryMode;
pub use session::SessionState;

// Re-exported so a host application only needs this one crate's types
// for the common path.
pub use guard_action::{ActionRequest, Policy, ProposedAction, ValidationOutcome};
pub use guard_integrity::{SignConfig, SignedConversation, VerifyResult as IntegrityVerifyResult};
pub use guard_judge::{JudgeContext, JudgeDecision, JudgeVerdict, LlmJudge};
pub use guard_scanner::{
    ContentSource, Detection, MediaType, Quarantined, QuarantineError, RiskLevel, ScanResult,
};
pub use guard_ops::{AuditEntry, AuditEventKind};
