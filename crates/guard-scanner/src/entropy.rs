//! # Entropy Analyzer (C3)
//!
//! Shannon entropy over character frequency, with a sliding-window maximum
//! to catch localized high-entropy segments (e.g. a GCG-style adversarial
//! suffix appended to otherwise ordinary text) that a whole-string average
//! would dilute away.
//!
//! ## References
//!
//! - Shannon, C.E. (1948). "A Mathematical Theory of Communication."
//! - Zou et al. (2023). "Universal and Transferable Adversarial Attacks on
//!   Aligned Language Models." <https://arxiv.org/abs/2307.15043>

use std::collections::HashMap;

/// Default sliding-window anomaly threshold, in bits/char.
pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 4.5;

/// Default sliding-window size, in characters.
pub const DEFAULT_WINDOW: usize = 50;

/// Result of an entropy analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyResult {
    /// Entropy of the whole input.
    pub mean: f64,
    /// Highest entropy observed in any window.
    pub max_window: f64,
    pub anomalous: bool,
}

/// Shannon entropy of `text`, in bits per character.
pub fn shannon_entropy(text: &str) -> f64 {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for &c in &chars {
        *freq.entry(c).or_insert(0) += 1;
    }

    let total = chars.len() as f64;
    freq.values().fold(0.0, |acc, &count| {
        let p = count as f64 / total;
        acc - p * p.log2()
    })
}

/// Analyze `text` for anomalous entropy using a sliding window of `window`
/// characters (default 50). Empty or single-character input is never
/// anomalous.
pub fn analyze(text: &str, window: usize, threshold: f64) -> EntropyResult {
    let chars: Vec<char> = text.chars().collect();
    let mean = shannon_entropy(text);

    if chars.len() < 2 {
        return EntropyResult {
            mean: 0.0,
            max_window: 0.0,
            anomalous: false,
        };
    }

    let window = window.max(1);
    let max_window = if chars.len() <= window {
        mean
    } else {
        let mut max_seen = 0.0_f64;
        for start in 0..=(chars.len() - window) {
            let slice: String = chars[start..start + window].iter().collect();
            let h = shannon_entropy(&slice);
            if h > max_seen {
                max_seen = h;
            }
        }
        max_seen
    };

    EntropyResult {
        mean,
        max_window,
        anomalous: max_window >= threshold,
    }
}

/// Analyze with the spec's default window (50) and threshold (4.5).
pub fn analyze_default(text: &str) -> EntropyResult {
    analyze(text, DEFAULT_WINDOW, DEFAULT_ENTROPY_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero_entropy() {
        let r = analyze_default("");
        assert_eq!(r.mean, 0.0);
        assert!(!r.anomalous);
    }

    #[test]
    fn single_char_is_zero_entropy() {
        let r = analyze_default("a");
        assert_eq!(r.mean, 0.0);
        assert!(!r.anomalous);
    }

    #[test]
    fn repeated_char_is_zero_entropy() {
        assert_eq!(shannon_entropy("aaaaaaaa"), 0.0);
    }

    #[test]
    fn natural_language_is_not_anomalous() {
        let r = analyze_default("What is the weather in San Francisco today?");
        assert!(!r.anomalous);
    }

    #[test]
    fn high_entropy_gibberish_is_anomalous() {
        let gibberish = "x9k2m3n4b5v6c7z8a1s2d3f4g5h6j7k8l9p0o9i8u7y6t5r4e3w2q1zM9xK2vB7";
        let r = analyze_default(gibberish);
        assert!(r.anomalous);
    }

    #[test]
    fn window_max_catches_localized_spike() {
        let padding = "the quick brown fox jumps over the lazy dog ".repeat(3);
        let suffix = "x9k2m3n4b5v6c7z8a1s2d3f4g5h6j7k8l9p0o9i8u7y6t5r4e3w2q1zM9xK2vB7";
        let combined = format!("{padding}{suffix}");
        let r = analyze(&combined, 50, DEFAULT_ENTROPY_THRESHOLD);
        assert!(r.anomalous);
        assert!(r.max_window > r.mean);
    }
}
