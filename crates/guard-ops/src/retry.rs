//! Auto-Retry Handler (C17): escalation paths invoked by the Recovery
//! State Machine when a blocked input should get a second chance under
//! stricter handling rather than an outright block.

use guard_scanner::{Detection, InputScanner, Quarantined, ScanResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Escalation {
    StricterScanner,
    Sandbox,
    Combined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EscalationPath {
    StricterScanner,
    Sandbox,
}

#[derive(Debug, Clone)]
pub struct RetryContext<'a> {
    pub attempt: u32,
    pub path: EscalationPath,
    pub detections: &'a [Detection],
}

pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, context: &RetryContext<'_>);
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryOutcome {
    pub attempt: u32,
    pub succeeded: bool,
    pub escalation: Option<EscalationPath>,
    pub scan_result: Option<ScanResult>,
    pub exhausted: bool,
}

fn resolve_path(escalation: Escalation, attempt: u32) -> EscalationPath {
    match escalation {
        Escalation::StricterScanner => EscalationPath::StricterScanner,
        Escalation::Sandbox => EscalationPath::Sandbox,
        Escalation::Combined => {
            if attempt == 1 {
                EscalationPath::StricterScanner
            } else {
                EscalationPath::Sandbox
            }
        }
    }
}

/// `paranoid_scanner` must already be configured with
/// `Sensitivity::Paranoid` — the escalation only decides *which* scanner
/// runs, configuring it is the caller's responsibility, mirroring how
/// `sandbox` routing is also delegated back to the caller.
pub fn attempt_retry(
    q: &Quarantined<String>,
    detections: &[Detection],
    attempt: u32,
    max_attempts: u32,
    escalation: Escalation,
    paranoid_scanner: &InputScanner,
    observer: Option<&dyn RetryObserver>,
) -> RetryOutcome {
    if attempt > max_attempts {
        return RetryOutcome {
            attempt,
            succeeded: false,
            escalation: None,
            scan_result: None,
            exhausted: true,
        };
    }

    let path = resolve_path(escalation, attempt);
    if let Some(observer) = observer {
        observer.on_retry(&RetryContext { attempt, path, detections });
    }

    match path {
        EscalationPath::StricterScanner => {
            let scan_result = paranoid_scanner.scan(q);
            let succeeded = scan_result.safe;
            RetryOutcome {
                attempt,
                succeeded,
                escalation: Some(path),
                scan_result: Some(scan_result),
                exhausted: false,
            }
        }
        EscalationPath::Sandbox => RetryOutcome {
            attempt,
            succeeded: true,
            escalation: Some(path),
            scan_result: None,
            exhausted: false,
        },
    }
}
