//! Facade-level error taxonomy. `InputBlocked`/`SessionQuarantined`/
//! `SessionTerminated` are expected control-flow outcomes on the hot
//! path, not exceptional failures — callers are expected to match on
//! them. Everything else aggregates a component's own error type
//! unchanged, since C8-C17 never swallow their own failures.

use guard_scanner::ScanResult;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuardError>;

#[derive(Debug, Error)]
pub enum GuardError {
    /// The Input Scanner rejected the message and the active recovery
    /// mode is `continue` (the default).
    #[error("input blocked by scanner")]
    InputBlocked { scan_result: ScanResult },

    /// The session was quarantined by a prior block; it never recovers.
    #[error("session is quarantined; construct a new facade to continue")]
    SessionQuarantined,

    /// The active recovery mode is `terminate-session`.
    #[error("session terminated by recovery policy")]
    SessionTerminated { scan_result: ScanResult },

    /// `judge_output` was called without a configured `LlmJudge`.
    #[error("LLM-judge not configured")]
    JudgeNotConfigured,

    /// `scan_media` was called without a configured media extractor.
    #[error("multi-modal extractor not configured")]
    MultiModalNotConfigured,

    /// `Policy::validate()` found structural problems with a
    /// deserialized policy document.
    #[error("invalid policy: {errors:?}")]
    PolicyInvalid { errors: Vec<String> },

    #[error(transparent)]
    Scanner(#[from] guard_scanner::ScannerError),

    #[error(transparent)]
    Quarantine(#[from] guard_scanner::QuarantineError),

    #[error(transparent)]
    Action(#[from] guard_action::ActionError),

    #[error(transparent)]
    Integrity(#[from] guard_integrity::IntegrityError),

    #[error(transparent)]
    Ops(#[from] guard_ops::OpsError),
}
