//! # Operational Guard Components
//!
//! The parts of the system that don't decide whether one message is
//! safe, but that keep the whole guard layer observable and recoverable
//! over the life of a session: turning untrusted content into structured
//! data under a restricted extractor (C13), firing alerts on suspicious
//! patterns across many audit entries (C14), fanning every audit entry
//! out to a bounded ring and N sinks (C16), and giving a blocked input a
//! second chance under stricter handling instead of an outright block
//! (C17).

pub mod alert;
pub mod audit;
pub mod error;
pub mod extractor;
pub mod retry;

pub use alert::{Alert, AlertAction, AlertCallback, AlertingEngine, Condition, Rule, WebhookDispatcher};
pub use audit::{AuditBus, AuditEntry, AuditEventKind, AuditSink, ConsoleSink};
pub use error::{OpsError, Result};
pub use extractor::{
    extract, ExtractConfig, ExtractionSchema, ExtractorLlm, FailMode, FieldType, SchemaField,
};
pub use retry::{attempt_retry, Escalation, EscalationPath, RetryContext, RetryObserver, RetryOutcome};
