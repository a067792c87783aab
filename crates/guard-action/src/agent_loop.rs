//! Agent-Loop Guard (C11): scans each step's model output, tracks
//! cumulative risk across a chain, and decays the available tool set as
//! the chain runs longer.

use guard_scanner::{ContentSource, InputScanner, Quarantined, ScanResult};
use serde::Serialize;

use crate::decay::{apply_decay, DecaySchedule};

pub const DEFAULT_MAX_STEPS: u64 = 25;
pub const DEFAULT_RISK_BUDGET: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct ChainStepRequest<T: Clone> {
    pub step: u64,
    pub max_steps: u64,
    pub cumulative_risk: f64,
    pub risk_budget: f64,
    pub initial_tools: Vec<T>,
    pub session_id: String,
    pub request_id: String,
}

impl<T: Clone> ChainStepRequest<T> {
    pub fn new(step: u64, initial_tools: Vec<T>, session_id: String, request_id: String) -> Self {
        Self {
            step,
            max_steps: DEFAULT_MAX_STEPS,
            cumulative_risk: 0.0,
            risk_budget: DEFAULT_RISK_BUDGET,
            initial_tools,
            session_id,
            request_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainStepResult<T: Clone + Serialize> {
    pub safe: bool,
    pub reason: Option<String>,
    pub cumulative_risk: f64,
    pub scan_result: Option<ScanResult>,
    pub available_tools: Vec<T>,
    pub budget_exhausted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentLoopAuditEntry {
    pub session_id: String,
    pub request_id: String,
    pub step: u64,
    pub safe: bool,
    pub cumulative_risk: f64,
}

pub trait AgentLoopAuditSink: Send + Sync {
    fn record(&self, entry: AgentLoopAuditEntry);
}

pub struct AgentLoopGuard {
    scanner: InputScanner,
    schedule: DecaySchedule,
    audit: Option<Box<dyn AgentLoopAuditSink>>,
}

impl AgentLoopGuard {
    pub fn new(scanner: InputScanner) -> Self {
        Self {
            scanner,
            schedule: DecaySchedule::default(),
            audit: None,
        }
    }

    pub fn with_decay_schedule(mut self, schedule: DecaySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_audit_sink(mut self, sink: Box<dyn AgentLoopAuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn guard_chain_step<T: Clone + Serialize>(
        &self,
        output: &str,
        request: &ChainStepRequest<T>,
    ) -> ChainStepResult<T> {
        let result = self.guard_chain_step_inner(output, request);
        if let Some(sink) = &self.audit {
            sink.record(AgentLoopAuditEntry {
                session_id: request.session_id.clone(),
                request_id: request.request_id.clone(),
                step: request.step,
                safe: result.safe,
                cumulative_risk: result.cumulative_risk,
            });
        }
        result
    }

    fn guard_chain_step_inner<T: Clone + Serialize>(
        &self,
        output: &str,
        request: &ChainStepRequest<T>,
    ) -> ChainStepResult<T> {
        // 1. budget check
        if request.step > request.max_steps {
            return ChainStepResult {
                safe: false,
                reason: Some(format!(
                    "step {} exceeds max_steps {}",
                    request.step, request.max_steps
                )),
                cumulative_risk: request.cumulative_risk,
                scan_result: None,
                available_tools: Vec::new(),
                budget_exhausted: true,
            };
        }

        // 2. scan the model output
        let quarantined = Quarantined::wrap(output.to_string(), ContentSource::ModelOutput, None);
        let text = quarantined
            .peek("agent-loop guard output scan")
            .expect("peek reason is non-empty")
            .clone();
        let scan_result = self.scanner.scan_text(&text);

        // 3. cumulative risk
        let new_risk = request.cumulative_risk + scan_result.score;
        if new_risk >= request.risk_budget {
            return ChainStepResult {
                safe: false,
                reason: Some(format!(
                    "cumulative risk {:.2} reached budget {:.2}",
                    new_risk, request.risk_budget
                )),
                cumulative_risk: new_risk,
                scan_result: Some(scan_result),
                available_tools: Vec::new(),
                budget_exhausted: false,
            };
        }

        // 4. per-step safety
        if !scan_result.safe {
            return ChainStepResult {
                safe: false,
                reason: Some("model output scan was unsafe".to_string()),
                cumulative_risk: new_risk,
                scan_result: Some(scan_result),
                available_tools: Vec::new(),
                budget_exhausted: false,
            };
        }

        // 5. privilege decay
        let available_tools = apply_decay(&request.initial_tools, request.step, &self.schedule);

        ChainStepResult {
            safe: true,
            reason: None,
            cumulative_risk: new_risk,
            scan_result: Some(scan_result),
            available_tools,
            budget_exhausted: false,
        }
    }
}
