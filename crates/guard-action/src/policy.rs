//! Policy data model: capability globs, per-tool rate limits, and the
//! data-flow exfiltration switch. Shared by the Action Validator (C10)
//! and the Agent-Loop Guard (C11).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_EXFILTRATION_TOOL_PATTERNS: &[&str] =
    &["send_*", "email_*", "http_*", "webhook_*"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimit {
    pub max: u32,
    pub window: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub require_approval: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataFlowPolicy {
    #[serde(default)]
    pub no_exfiltration: bool,
    #[serde(default)]
    pub exfiltration_tool_patterns: Vec<String>,
}

impl DataFlowPolicy {
    pub fn tool_patterns(&self) -> Vec<String> {
        if self.exfiltration_tool_patterns.is_empty() {
            DEFAULT_EXFILTRATION_TOOL_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.exfiltration_tool_patterns.clone()
        }
    }
}

/// Root policy document. `input`/`output`/`alignment` are forwarded,
/// unstructured, to the scanner/judge components they configure — the
/// spec leaves their shape to those components, not to the policy layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub limits: HashMap<String, RateLimit>,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default)]
    pub alignment: serde_json::Value,
    #[serde(default)]
    pub data_flow: DataFlowPolicy,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityDecision {
    Deny,
    RequireApproval,
    Allow,
    DefaultDeny,
}

/// `*` matches anything; a `prefix_*` glob matches by prefix; anything
/// else must match exactly.
pub fn glob_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return value.starts_with(prefix);
    }
    pattern == value
}

fn any_match(globs: &[String], tool: &str) -> bool {
    globs.iter().any(|g| glob_match(g, tool))
}

impl Policy {
    /// Frozen evaluation order: deny, then requireApproval, then allow,
    /// then default-deny (only when the allow list is non-empty).
    pub fn evaluate_capability(&self, tool: &str) -> CapabilityDecision {
        if any_match(&self.capabilities.deny, tool) {
            return CapabilityDecision::Deny;
        }
        if any_match(&self.capabilities.require_approval, tool) {
            return CapabilityDecision::RequireApproval;
        }
        if any_match(&self.capabilities.allow, tool) {
            return CapabilityDecision::Allow;
        }
        if !self.capabilities.allow.is_empty() {
            return CapabilityDecision::DefaultDeny;
        }
        CapabilityDecision::Allow
    }

    /// Structural validation of an already-deserialized policy document.
    /// Parsing a policy file itself (JSON or the minimal YAML dialect) is
    /// external I/O left to the caller; this only checks the value once
    /// it exists in memory.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.version != 1 {
            errors.push(format!("policy version must be 1, got {}", self.version));
        }
        for (tool, limit) in &self.limits {
            if limit.max == 0 {
                errors.push(format!("limit for '{tool}' has max=0"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
