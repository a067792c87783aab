//! # Streaming Violation Monitor
//!
//! A text→text transform sitting between a model's token stream and the
//! caller, scanning for canary leaks, PII, secrets, and injection payloads
//! without adding latency on the happy path.
//!
//! ## Design
//!
//! The monitor withholds the trailing `overlap` characters of each chunk
//! (overlap = longest configured canary, or a conservative margin, plus
//! the configured chunk size) so that a violation split across a chunk
//! boundary is still caught before any of its bytes are forwarded. On a
//! canary, secret, or injection match, the stream is terminated
//! immediately and every held-back byte is discarded. On PII, the text is
//! either redacted in place (`pii_redaction = true`, the default) or
//! treated as a terminating violation.
//!
//! `ChunkStrategy` only controls how emitted text is grouped for the
//! caller (sentence/tokens/fixed); it never changes what gets scanned.

pub mod monitor;
pub mod pii;
pub mod secrets;
pub mod violation;

pub use monitor::{ChunkStrategy, StreamConfig, StreamMonitor, StreamOutcome, DEFAULT_CHUNK_SIZE};
pub use violation::{Violation, ViolationType};
