//! Denial-of-Wallet tracking: a single rolling window across tool calls,
//! operations (tool calls + sandbox triggers), and sandbox triggers.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct DowThresholds {
    pub max_tool_calls: u64,
    pub max_operations: u64,
    pub max_sandbox_triggers: u64,
    pub window: Duration,
}

impl Default for DowThresholds {
    fn default() -> Self {
        Self {
            max_tool_calls: 100,
            max_operations: 500,
            max_sandbox_triggers: 50,
            window: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug)]
pub struct DowTracker {
    thresholds: DowThresholds,
    window_start: Option<Instant>,
    tool_calls: u64,
    sandbox_triggers: u64,
}

impl DowTracker {
    pub fn new(thresholds: DowThresholds) -> Self {
        Self {
            thresholds,
            window_start: None,
            tool_calls: 0,
            sandbox_triggers: 0,
        }
    }

    fn roll_window_if_elapsed(&mut self, now: Instant) {
        match self.window_start {
            None => self.window_start = Some(now),
            Some(start) if now.duration_since(start) > self.thresholds.window => {
                self.window_start = Some(now);
                self.tool_calls = 0;
                self.sandbox_triggers = 0;
            }
            Some(_) => {}
        }
    }

    pub fn operations(&self) -> u64 {
        self.tool_calls + self.sandbox_triggers
    }

    /// Would recording one more tool call exceed any threshold?
    pub fn would_exceed_on_tool_call(&mut self, now: Instant) -> bool {
        self.roll_window_if_elapsed(now);
        self.tool_calls + 1 > self.thresholds.max_tool_calls
            || self.operations() + 1 > self.thresholds.max_operations
    }

    pub fn record_tool_call(&mut self, now: Instant) {
        self.roll_window_if_elapsed(now);
        self.tool_calls += 1;
    }

    pub fn would_exceed_on_sandbox_trigger(&mut self, now: Instant) -> bool {
        self.roll_window_if_elapsed(now);
        self.sandbox_triggers + 1 > self.thresholds.max_sandbox_triggers
            || self.operations() + 1 > self.thresholds.max_operations
    }

    pub fn record_sandbox_trigger(&mut self, now: Instant) {
        self.roll_window_if_elapsed(now);
        self.sandbox_triggers += 1;
    }
}
