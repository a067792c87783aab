//! Audit Bus (C16): an in-memory ring of entries plus fan-out to N
//! sinks. Writes are synchronous from the producer's point of view —
//! each [`AuditBus::record`] call returns only once every sink has
//! handled the entry, even if a sink itself hands off to something
//! asynchronous internally.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub const DEFAULT_RING_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label")]
pub enum AuditEventKind {
    ScanBlocked,
    ScanAllowed,
    ToolCallBlocked,
    ToolCallAllowed,
    KillSwitch,
    DenialOfWallet,
    Custom(String),
}

impl AuditEventKind {
    pub fn label(&self) -> &str {
        match self {
            AuditEventKind::ScanBlocked => "scan_blocked",
            AuditEventKind::ScanAllowed => "scan_allowed",
            AuditEventKind::ToolCallBlocked => "tool_call_blocked",
            AuditEventKind::ToolCallAllowed => "tool_call_allowed",
            AuditEventKind::KillSwitch => "kill_switch",
            AuditEventKind::DenialOfWallet => "denial_of_wallet",
            AuditEventKind::Custom(label) => label,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub kind: AuditEventKind,
    pub session_id: Option<String>,
    pub detail: serde_json::Value,
    pub timestamp_ms: u64,
}

impl AuditEntry {
    pub fn new(kind: AuditEventKind, session_id: Option<String>, detail: serde_json::Value) -> Self {
        Self {
            kind,
            session_id,
            detail,
            timestamp_ms: now_unix_millis(),
        }
    }
}

fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub trait AuditSink: Send + Sync {
    fn handle(&self, entry: &AuditEntry);
}

/// Logs every entry through `tracing` at warn for blocks/kills, info
/// otherwise.
pub struct ConsoleSink;

impl AuditSink for ConsoleSink {
    fn handle(&self, entry: &AuditEntry) {
        match entry.kind {
            AuditEventKind::ScanBlocked
            | AuditEventKind::ToolCallBlocked
            | AuditEventKind::KillSwitch
            | AuditEventKind::DenialOfWallet => {
                tracing::warn!(kind = entry.kind.label(), session_id = ?entry.session_id, "audit event");
            }
            _ => {
                tracing::info!(kind = entry.kind.label(), session_id = ?entry.session_id, "audit event");
            }
        }
    }
}

pub struct AuditBus {
    capacity: usize,
    ring: Mutex<VecDeque<AuditEntry>>,
    sinks: Vec<Box<dyn AuditSink>>,
}

impl AuditBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn AuditSink>) {
        self.sinks.push(sink);
    }

    pub fn record(&self, entry: AuditEntry) {
        {
            let mut ring = self.ring.lock().expect("audit ring mutex poisoned");
            if ring.len() >= self.capacity {
                ring.pop_front();
            }
            ring.push_back(entry.clone());
        }
        for sink in &self.sinks {
            sink.handle(&entry);
        }
    }

    /// Most recent `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<AuditEntry> {
        let ring = self.ring.lock().expect("audit ring mutex poisoned");
        let skip = ring.len().saturating_sub(n);
        ring.iter().skip(skip).cloned().collect()
    }
}

impl Default for AuditBus {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}
