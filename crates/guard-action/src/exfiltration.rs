//! Exfiltration fingerprint guard: remember lines seen in prior tool
//! output, reject later calls to exfiltration-shaped tools whose
//! parameters reproduce one of those lines verbatim.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::policy::{glob_match, DataFlowPolicy};

const MIN_LINE_LEN: usize = 16;

fn fingerprint(line: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    line.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Default)]
pub struct ExfiltrationGuard {
    fingerprints: HashSet<u64>,
}

impl ExfiltrationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every non-trivial line of `output` as a fingerprint to
    /// watch for in later outbound tool parameters.
    pub fn observe_output(&mut self, output: &str) {
        for line in output.lines() {
            let trimmed = line.trim();
            if trimmed.len() >= MIN_LINE_LEN {
                self.fingerprints.insert(fingerprint(trimmed));
            }
        }
    }

    fn value_contains_fingerprint(&self, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed.len() >= MIN_LINE_LEN && self.fingerprints.contains(&fingerprint(trimmed)) {
            return true;
        }
        value
            .lines()
            .map(str::trim)
            .filter(|l| l.len() >= MIN_LINE_LEN)
            .any(|l| self.fingerprints.contains(&fingerprint(l)))
    }

    /// Is `tool` shaped like an exfiltration sink under this data-flow
    /// policy?
    pub fn is_exfiltration_tool(&self, policy: &DataFlowPolicy, tool: &str) -> bool {
        policy.tool_patterns().iter().any(|p| glob_match(p, tool))
    }

    /// Does any string value in `params` reproduce a fingerprinted line?
    pub fn params_leak_fingerprint(&self, params: &serde_json::Value) -> bool {
        match params {
            serde_json::Value::String(s) => self.value_contains_fingerprint(s),
            serde_json::Value::Array(items) => {
                items.iter().any(|v| self.params_leak_fingerprint(v))
            }
            serde_json::Value::Object(map) => {
                map.values().any(|v| self.params_leak_fingerprint(v))
            }
            _ => false,
        }
    }
}
