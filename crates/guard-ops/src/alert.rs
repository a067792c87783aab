//! Alerting Engine (C14): rule-based alerts over the audit stream, with
//! per-rule cooldowns so one burst of events doesn't fire the same alert
//! a thousand times.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditEventKind};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(60_000);
const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub enum Condition {
    /// Count of `kind` events in the rolling window reaches `threshold`.
    RateSpike { kind: AuditEventKind, threshold: usize },
    /// Count of `kill_switch` events in the window reaches `threshold`.
    SessionKills { threshold: usize },
    /// Count of `denial_of_wallet` events in the window reaches `threshold`.
    CostAnomaly { threshold: usize },
    /// blocked / total scan-decision ratio in the window reaches `threshold`.
    ScanBlockRate { threshold: f64 },
    /// Count of blocked decisions sharing the triggering entry's
    /// `session_id` reaches `threshold`.
    RepeatedAttacker { threshold: usize },
}

#[derive(Debug, Clone)]
pub enum AlertAction {
    Webhook(String),
    Log,
    Callback,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub condition: Condition,
    pub action: AlertAction,
    pub cooldown: Duration,
    pub enabled: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>, condition: Condition, action: AlertAction) -> Self {
        Self {
            name: name.into(),
            condition,
            action,
            cooldown: DEFAULT_COOLDOWN,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub rule_name: String,
    pub message: String,
    pub resolved: bool,
}

pub trait WebhookDispatcher: Send + Sync {
    fn dispatch(&self, url: &str, alert: &Alert);
}

pub trait AlertCallback: Send + Sync {
    fn on_alert(&self, alert: &Alert);
}

pub struct AlertingEngine {
    rules: Vec<Rule>,
    window: Duration,
    history: VecDeque<(Instant, AuditEntry)>,
    last_fired: HashMap<String, Instant>,
    active: HashMap<Uuid, Alert>,
    webhook: Option<Box<dyn WebhookDispatcher>>,
    callback: Option<Box<dyn AlertCallback>>,
}

impl AlertingEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            window: DEFAULT_WINDOW,
            history: VecDeque::new(),
            last_fired: HashMap::new(),
            active: HashMap::new(),
            webhook: None,
            callback: None,
        }
    }

    pub fn with_webhook_dispatcher(mut self, dispatcher: Box<dyn WebhookDispatcher>) -> Self {
        self.webhook = Some(dispatcher);
        self
    }

    pub fn with_callback(mut self, callback: Box<dyn AlertCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    fn prune(&mut self, now: Instant) {
        while let Some((at, _)) = self.history.front() {
            if now.duration_since(*at) > self.window {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    fn count(&self, mut predicate: impl FnMut(&AuditEntry) -> bool) -> usize {
        self.history.iter().filter(|(_, e)| predicate(e)).count()
    }

    fn evaluate_condition(&self, condition: &Condition, triggering: &AuditEntry) -> bool {
        match condition {
            Condition::RateSpike { kind, threshold } => {
                self.count(|e| &e.kind == kind) >= *threshold
            }
            Condition::SessionKills { threshold } => {
                self.count(|e| e.kind == AuditEventKind::KillSwitch) >= *threshold
            }
            Condition::CostAnomaly { threshold } => {
                self.count(|e| e.kind == AuditEventKind::DenialOfWallet) >= *threshold
            }
            Condition::ScanBlockRate { threshold } => {
                let blocked = self.count(|e| e.kind == AuditEventKind::ScanBlocked);
                let allowed = self.count(|e| e.kind == AuditEventKind::ScanAllowed);
                let total = blocked + allowed;
                total > 0 && (blocked as f64 / total as f64) >= *threshold
            }
            Condition::RepeatedAttacker { threshold } => {
                let Some(session_id) = &triggering.session_id else {
                    return false;
                };
                self.count(|e| {
                    e.session_id.as_deref() == Some(session_id.as_str())
                        && matches!(e.kind, AuditEventKind::ScanBlocked | AuditEventKind::ToolCallBlocked)
                }) >= *threshold
            }
        }
    }

    /// Feed one audit entry in, evaluate every enabled rule, and return
    /// any alerts that fired (outside their cooldown).
    pub fn on_audit_entry(&mut self, entry: AuditEntry, now: Instant) -> Vec<Alert> {
        self.history.push_back((now, entry.clone()));
        self.prune(now);

        let mut fired = Vec::new();
        let rules = self.rules.clone();
        for rule in &rules {
            if !rule.enabled {
                continue;
            }
            if let Some(last) = self.last_fired.get(&rule.name) {
                if now.duration_since(*last) < rule.cooldown {
                    continue;
                }
            }
            if self.evaluate_condition(&rule.condition, &entry) {
                let alert = Alert {
                    id: Uuid::new_v4(),
                    rule_name: rule.name.clone(),
                    message: format!("rule '{}' fired", rule.name),
                    resolved: false,
                };
                self.last_fired.insert(rule.name.clone(), now);
                self.active.insert(alert.id, alert.clone());
                self.dispatch_action(&rule.action, &alert);
                fired.push(alert);
            }
        }
        fired
    }

    fn dispatch_action(&self, action: &AlertAction, alert: &Alert) {
        match action {
            AlertAction::Webhook(url) => {
                if let Some(dispatcher) = &self.webhook {
                    dispatcher.dispatch(url, alert);
                } else {
                    tracing::warn!(url = %url, rule = %alert.rule_name, "alert webhook fired with no dispatcher configured");
                }
            }
            AlertAction::Log => {
                tracing::warn!(rule = %alert.rule_name, "alert fired");
            }
            AlertAction::Callback => {
                if let Some(callback) = &self.callback {
                    callback.on_alert(alert);
                }
            }
        }
    }

    pub fn resolve_alert(&mut self, id: Uuid) {
        if let Some(alert) = self.active.get_mut(&id) {
            alert.resolved = true;
        }
    }

    /// Only unresolved alerts.
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.active.values().filter(|a| !a.resolved).cloned().collect()
    }
}
