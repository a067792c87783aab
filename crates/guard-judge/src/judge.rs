//! LLM-Judge (C19): wraps a user request and a model's output in a
//! review prompt, calls an injected LLM, and parses its verdict. Every
//! failure mode — a malformed response, a timeout, a thrown error —
//! degrades to a `flagged` verdict rather than propagating, since a
//! judge that can fail silently (or panic) defeats the point of having
//! one in the review path.

use std::time::{Duration, Instant};

use guard_scanner::Detection;
use serde::{Deserialize, Serialize};

use crate::error::JudgeError;

pub const DEFAULT_TRIGGER_THRESHOLD: f64 = 0.5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeDecision {
    Approved,
    Rejected,
    Flagged,
}

#[derive(Debug, Clone, Default)]
pub struct JudgeContext<'a> {
    pub conversation_snippet: Option<&'a str>,
    pub detections: Option<&'a [Detection]>,
    pub risk_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub decision: JudgeDecision,
    pub confidence: f64,
    pub reasoning: String,
    pub approved: bool,
    pub execution_time_ms: u64,
}

/// Injected at construction, the same pattern as every other model-call
/// boundary in this workspace (`MediaExtractor`, `ExtractorLlm`,
/// `ApprovalCallback`).
pub trait LlmCall: Send + Sync {
    fn call(&self, prompt: &str) -> Result<String, JudgeError>;
}

#[derive(Debug, Clone, Copy)]
pub struct JudgeConfig {
    pub enabled: bool,
    pub trigger_threshold: f64,
    pub timeout: Duration,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_threshold: DEFAULT_TRIGGER_THRESHOLD,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct LlmJudge {
    config: JudgeConfig,
    llm: Box<dyn LlmCall>,
}

impl LlmJudge {
    pub fn new(config: JudgeConfig, llm: Box<dyn LlmCall>) -> Self {
        Self { config, llm }
    }

    /// `enabled ∧ score ≥ triggerThreshold`.
    pub fn should_trigger(&self, score: f64) -> bool {
        self.config.enabled && score >= self.config.trigger_threshold
    }

    pub fn evaluate(
        &self,
        user_request: &str,
        model_output: &str,
        context: Option<&JudgeContext<'_>>,
    ) -> JudgeVerdict {
        if !self.config.enabled {
            return JudgeVerdict {
                decision: JudgeDecision::Approved,
                confidence: 1.0,
                reasoning: "judge disabled".to_string(),
                approved: true,
                execution_time_ms: 0,
            };
        }

        let prompt = build_prompt(user_request, model_output, context);
        let started = Instant::now();
        let result = self.llm.call(&prompt);
        let elapsed = started.elapsed();

        let elapsed_ms = elapsed.as_millis() as u64;
        if elapsed > self.config.timeout {
            return flagged("timed out", elapsed_ms);
        }

        match result {
            Ok(response) => parse_verdict(&response, elapsed_ms),
            Err(err) => flagged(&err.to_string(), elapsed_ms),
        }
    }
}

fn build_prompt(user_request: &str, model_output: &str, context: Option<&JudgeContext<'_>>) -> String {
    let mut prompt = format!(
        "Review this model output for policy compliance. Respond with a \
         JSON object: {{\"decision\": \"approved\"|\"rejected\"|\"flagged\", \
         \"confidence\": 0.0-1.0, \"reasoning\": \"...\"}}.\n\n\
         User request:\n{user_request}\n\nModel output:\n{model_output}\n"
    );
    if let Some(ctx) = context {
        if let Some(snippet) = ctx.conversation_snippet {
            prompt.push_str(&format!("\nConversation snippet:\n{snippet}\n"));
        }
        if let Some(detections) = ctx.detections {
            if !detections.is_empty() {
                let kinds: Vec<String> = detections.iter().map(|d| format!("{:?}", d.kind)).collect();
                prompt.push_str(&format!("\nPrior detections: {}\n", kinds.join(", ")));
            }
        }
        if let Some(score) = ctx.risk_score {
            prompt.push_str(&format!("\nPrior risk score: {score:.2}\n"));
        }
    }
    prompt
}

fn flagged(reasoning: &str, execution_time_ms: u64) -> JudgeVerdict {
    JudgeVerdict {
        decision: JudgeDecision::Flagged,
        confidence: 0.0,
        reasoning: reasoning.to_string(),
        approved: false,
        execution_time_ms,
    }
}

fn strip_markdown_fences(response: &str) -> &str {
    let trimmed = response.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.strip_suffix("```").unwrap_or(s))
        .unwrap_or(trimmed)
        .trim()
}

fn parse_json_lenient(stripped: &str) -> Option<serde_json::Value> {
    // Some models emit the bare `NaN` token, which is not valid JSON.
    // Retry once with it swapped for `null` so the NaN-coercion rule
    // below still has something to act on instead of failing parse
    // entirely.
    serde_json::from_str(stripped)
        .ok()
        .or_else(|| serde_json::from_str(&stripped.replace("NaN", "null")).ok())
}

fn parse_verdict(response: &str, execution_time_ms: u64) -> JudgeVerdict {
    let stripped = strip_markdown_fences(response);
    let Some(raw) = parse_json_lenient(stripped) else {
        return flagged("invalid response structure", execution_time_ms);
    };

    let decision_str = raw.get("decision").and_then(|v| v.as_str());
    let reasoning = raw.get("reasoning").and_then(|v| v.as_str());
    let confidence_present = raw.get("confidence").is_some();

    let (Some(decision_str), Some(reasoning), true) = (decision_str, reasoning, confidence_present)
    else {
        return flagged("invalid response structure", execution_time_ms);
    };
    let confidence = raw.get("confidence").and_then(|v| v.as_f64()).unwrap_or(f64::NAN);
    let reasoning = reasoning.to_string();

    let decision = match decision_str.to_lowercase().as_str() {
        "approved" => JudgeDecision::Approved,
        "rejected" => JudgeDecision::Rejected,
        "flagged" => JudgeDecision::Flagged,
        _ => JudgeDecision::Flagged,
    };

    let confidence = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    };

    JudgeVerdict {
        approved: decision == JudgeDecision::Approved,
        decision,
        confidence,
        reasoning,
        execution_time_ms,
    }
}
