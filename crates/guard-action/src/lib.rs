//! # Action Validator & Agent-Loop Guard
//!
//! Everything that gates what an agent is allowed to *do*, as opposed to
//! what it is allowed to *read* (that is `guard-scanner`'s job).
//!
//! ## Threat model
//!
//! - A tool call might be explicitly forbidden, or shaped like one that
//!   should require a human to sign off first.
//! - A compromised agent might hammer a tool far past any legitimate
//!   calling rate, or run up a provider bill through sheer volume
//!   (denial-of-wallet).
//! - A tool call's parameters might themselves be injection payloads
//!   (a "command" parameter containing shell metacharacters, a "query"
//!   parameter containing a SQL injection signature) or might try to
//!   smuggle out data seen in an earlier tool's output to an
//!   internet-facing tool.
//! - An agent loop that runs for many steps accumulates risk even when
//!   no single step looks dangerous in isolation, and should lose
//!   privileges as it goes.
//!
//! ## Architecture
//!
//! [`validator::ActionValidator`] (C10) runs a proposed tool call through
//! a frozen evaluation order: policy ACL, rate limit, denial-of-wallet,
//! parameter safety, parameter content scan (via `guard-scanner`),
//! exfiltration fingerprinting, then approval. [`agent_loop::AgentLoopGuard`]
//! (C11) scans each step's model output, tracks cumulative risk across a
//! chain, and decays the available tool set on a fixed schedule.
//!
//! Both emit audit events through injected callback traits rather than
//! writing to any particular sink directly, the same pattern used for the
//! approval callback: dynamic dispatch at the construction boundary, not
//! baked-in transport.

pub mod agent_loop;
pub mod decay;
pub mod dow;
pub mod error;
pub mod exfiltration;
pub mod param_safety;
pub mod policy;
pub mod rate_limit;
pub mod validator;

pub use agent_loop::{
    AgentLoopAuditEntry, AgentLoopAuditSink, AgentLoopGuard, ChainStepRequest, ChainStepResult,
};
pub use decay::{apply_decay, DecaySchedule};
pub use dow::{DowThresholds, DowTracker};
pub use error::{ActionError, Result};
pub use exfiltration::ExfiltrationGuard;
pub use policy::{CapabilityDecision, Capabilities, DataFlowPolicy, Policy, RateLimit};
pub use rate_limit::{parse_window, RateLimiter};
pub use validator::{
    ActionRequest, ActionValidator, ApprovalCallback, AuditEvent, AuditSink, ProposedAction,
    ValidationOutcome,
};
