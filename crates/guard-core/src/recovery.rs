//! Recovery modes applied by the Facade whenever the Input Scanner
//! blocks a message. One mode is active per facade instance.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryMode {
    /// Raise `InputBlocked` and leave session state untouched.
    Continue,
    /// Emit an audit event and return the conversation with the
    /// offending (last) entry stripped.
    ResetLast,
    /// Mark the session quarantined; every further `guard_input` call
    /// raises `SessionQuarantined` immediately.
    QuarantineSession,
    /// Emit an audit event and raise `SessionTerminated`.
    TerminateSession,
    /// Delegate to the auto-retry handler; fall back to `Continue` on
    /// exhaustion.
    AutoRetry,
}

impl Default for RecoveryMode {
    fn default() -> Self {
        Self::Continue
    }
}
