//! # HMAC Integrity Chain
//!
//! Per-message MAC plus a chained hash over an entire conversation, so
//! any tampering with a signed assistant message — or with the order
//! messages are stored in — is detectable after the fact.
//!
//! ## Threat model
//!
//! | Threat | Defense |
//! |---|---|
//! | A stored assistant message is edited after the fact | per-message HMAC mismatch |
//! | Messages are reordered, inserted, or dropped | chain hash mismatch |
//! | An attacker without the session secret forges a signature | HMAC unforgeability |
//!
//! ## Design
//!
//! `assistant_only` (on by default) only signs assistant messages —
//! user and system turns are not attacker-controlled in the sense this
//! chain cares about, so signing them adds no tamper evidence and only
//! costs MAC computations. The chain hash covers every entry regardless
//! of `assistant_only`, so reordering or dropping a user turn still
//! invalidates the chain even though that turn was never itself signed.

mod error;
mod message;

pub use error::{IntegrityError, Result};
pub use message::{
    Message, Role, SignConfig, SignedConversation, SignedMessage, Signer, VerifyResult,
};
