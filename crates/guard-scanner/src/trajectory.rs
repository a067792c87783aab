//! # Trajectory Analyzer (C7)
//!
//! Looks across the user-role subsequence of a conversation rather than at
//! any single message: a topic jump between consecutive turns, or a
//! monotonically increasing count of risk keywords, can indicate a
//! multi-turn escalation attack that no single-message scan would catch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.1;
pub const ESCALATION_COUNT_THRESHOLD: usize = 3;

const RISK_KEYWORDS: &[&str] = &[
    "bypass",
    "exploit",
    "hack",
    "jailbreak",
    "override",
    "admin",
    "pretend",
    "shell",
    "payload",
    "credential",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResult {
    /// Pairwise similarity between consecutive user messages.
    pub similarities: Vec<f64>,
    /// Indices (into `similarities`) where similarity fell below the drift
    /// threshold.
    pub drift_indices: Vec<usize>,
    pub escalation_detected: bool,
    pub escalation_keywords: Vec<String>,
}

fn token_bag(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Cosine-like similarity between two token bags: intersection size over
/// the geometric mean of the two bag sizes.
fn bag_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    (intersection / ((a.len() as f64).sqrt() * (b.len() as f64).sqrt())).min(1.0)
}

fn risk_keyword_hits(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    RISK_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
        .collect()
}

/// Analyze the user-role subsequence `messages` for drift and escalation.
pub fn analyze(messages: &[&str], drift_threshold: f64) -> TrajectoryResult {
    let bags: Vec<HashSet<String>> = messages.iter().map(|m| token_bag(m)).collect();

    let mut similarities = Vec::new();
    let mut drift_indices = Vec::new();
    for i in 1..bags.len() {
        let sim = bag_similarity(&bags[i - 1], &bags[i]);
        similarities.push(sim);
        if sim < drift_threshold {
            drift_indices.push(i - 1);
        }
    }

    let mut cumulative_counts = Vec::with_capacity(messages.len());
    let mut running = 0usize;
    let mut seen_keywords: HashSet<String> = HashSet::new();
    for msg in messages {
        let hits = risk_keyword_hits(msg);
        running += hits.len();
        seen_keywords.extend(hits);
        cumulative_counts.push(running);
    }

    let escalation_detected = cumulative_counts.len() >= 2
        && cumulative_counts.windows(2).all(|w| w[1] >= w[0])
        && *cumulative_counts.last().unwrap_or(&0) >= ESCALATION_COUNT_THRESHOLD
        && cumulative_counts.iter().any(|&c| c > 0)
        && is_strictly_increasing_enough(&cumulative_counts);

    let mut escalation_keywords: Vec<String> = seen_keywords.into_iter().collect();
    escalation_keywords.sort();

    TrajectoryResult {
        similarities,
        drift_indices,
        escalation_detected,
        escalation_keywords,
    }
}

/// Require at least one strict increase somewhere in the series, so a flat
/// run of messages that all mention the same single keyword doesn't count
/// as "escalating".
fn is_strictly_increasing_enough(counts: &[usize]) -> bool {
    counts.windows(2).any(|w| w[1] > w[0])
}

/// Analyze with the spec's default drift threshold (0.1).
pub fn analyze_default(messages: &[&str]) -> TrajectoryResult {
    analyze(messages, DEFAULT_DRIFT_THRESHOLD)
}
