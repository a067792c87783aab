//! # LLM-Judge
//!
//! A single model call reviewing a single piece of output, used as a
//! last line of review for cases the structural scanners (C8/C9) can't
//! settle on their own — intent misalignment, subtle policy violations,
//! anything that needs judgment rather than pattern matching.
//!
//! ## Threat model
//!
//! - The judge model call itself can fail, hang, or come back malformed;
//!   none of those should silently pass review, so every failure mode
//!   degrades to a `flagged` verdict rather than panicking or defaulting
//!   to approval.
//! - A judge that is merely disabled (no model configured) is not a
//!   failure — it's a no-op that always approves, since callers decide
//!   whether to wire one up at all.
//!
//! ## Design
//!
//! `LlmCall` is injected at construction, the same pattern used for
//! every other model-call boundary in this workspace. Confidence is
//! clamped into `[0, 1]` and NaN-coerced to 0 before being returned, so
//! downstream `shouldTrigger`-style gates never have to defend against
//! out-of-range scores themselves.

mod error;
mod judge;

pub use error::JudgeError;
pub use judge::{
    JudgeConfig, JudgeContext, JudgeDecision, JudgeVerdict, LlmCall, LlmJudge,
    DEFAULT_TIMEOUT, DEFAULT_TRIGGER_THRESHOLD,
};
