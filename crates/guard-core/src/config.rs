//! Facade configuration: one struct per owned component, plus the
//! global knobs (scan strategy, recovery mode, audit ring size) that
//! belong to the facade itself rather than to any single component.

use serde::{Deserialize, Serialize};

use guard_action::Policy;
use guard_ops::{Escalation, DEFAULT_RING_CAPACITY};
use guard_scanner::{MultiModalConfig, ScannerConfig};
use guard_stream::StreamConfig;

use crate::recovery::RecoveryMode;

/// Which subset of the conversation `guard_input` scans. `AllUser` and
/// `FullHistory` additionally run trajectory analysis over the
/// user-role subsequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanStrategy {
    LastUser,
    AllUser,
    FullHistory,
}

impl Default for ScanStrategy {
    fn default() -> Self {
        Self::LastUser
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub mode: RecoveryMode,
    pub max_retry_attempts: u32,
    pub escalation: Escalation,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            mode: RecoveryMode::default(),
            max_retry_attempts: 3,
            escalation: Escalation::Combined,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub scan_strategy: ScanStrategy,
    pub audit_ring_capacity: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            scan_strategy: ScanStrategy::default(),
            audit_ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

/// Root configuration for [`crate::GuardFacade`]. Each field configures
/// exactly the component it's named for; there is no cross-component
/// coupling here beyond what `RecoveryConfig`/`GlobalConfig` need.
#[derive(Debug, Clone, Default)]
pub struct GuardConfig {
    pub scanner: ScannerConfig,
    pub policy: Policy,
    pub stream: StreamConfig,
    pub multimodal: MultiModalConfig,
    pub recovery: RecoveryConfig,
    pub global: GlobalConfig,
}
