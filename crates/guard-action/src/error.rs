//! Error types for tool-call policy enforcement and agent-loop guarding.

use thiserror::Error;

/// Result type alias for action-validator and agent-loop operations.
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors that can occur while validating a proposed tool call or
/// guarding an agent-loop step.
///
/// # Security Notes
///
/// Error messages are designed to provide useful debugging information
/// without leaking sensitive execution state to potential attackers.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Tool is on the policy deny list, or not covered by a non-empty
    /// allow list.
    #[error("tool '{tool}' is denied by policy")]
    PolicyDenied { tool: String },

    /// Tool requires approval and no approval callback was configured.
    #[error("tool '{tool}' requires approval but no approval callback is configured")]
    ApprovalNotConfigured { tool: String },

    /// The approval callback explicitly rejected the call.
    #[error("tool '{tool}' was not approved")]
    ApprovalDenied { tool: String },

    /// Per-tool rate limit exceeded.
    #[error("rate limit exceeded for tool '{tool}': max {max} per {window}")]
    RateLimited {
        tool: String,
        max: u32,
        window: String,
    },

    /// Denial-of-wallet rolling-window threshold exceeded.
    #[error("denial-of-wallet threshold exceeded: {reason}")]
    DenialOfWallet { reason: String },

    /// Shell metacharacter or SQL injection signature in a command/query
    /// shaped parameter.
    #[error("unsafe parameter '{key}': {reason}")]
    UnsafeParameter { key: String, reason: &'static str },

    /// MCP parameter content scan (via guard-scanner) found it unsafe.
    #[error("parameter scan blocked call to '{tool}': {reason}")]
    ParamScanBlocked { tool: String, reason: String },

    /// Proposed call would leak fingerprinted prior output to an
    /// exfiltration-shaped tool.
    #[error("exfiltration guard blocked call to '{tool}'")]
    ExfiltrationBlocked { tool: String },

    /// Agent-loop step index exceeded `max_steps`.
    #[error("agent loop budget exhausted at step {step} (max {max_steps})")]
    BudgetExhausted { step: u64, max_steps: u64 },

    /// Cumulative risk across agent-loop steps exceeded the risk budget.
    #[error("cumulative risk {cumulative} exceeds budget {budget}")]
    RiskBudgetExceeded { cumulative: f64, budget: f64 },
}
