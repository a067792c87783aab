//! # Perplexity Analyzer (C4)
//!
//! Character n-gram perplexity against a built-in English profile, using
//! Laplace-smoothed negative log-probability scaled by an n-gram
//! familiarity factor. Catches GCG-style adversarial suffixes and base64
//! payloads that read as gibberish to a trigram model even when their
//! character-frequency entropy alone is unremarkable.
//!
//! ## References
//!
//! - Jelinek et al. (1977). "Perplexity — a measure of the difficulty of
//!   speech recognition tasks."
//! - Alon & Kamfonas (2023). "Detecting Language Model Attacks with
//!   Perplexity." <https://arxiv.org/abs/2308.14132>

use std::collections::HashMap;

pub const DEFAULT_ORDER: usize = 3;
pub const DEFAULT_THRESHOLD: f64 = 4.5;
pub const DEFAULT_WINDOW: usize = 50;

/// A language profile: n-gram order plus the n-grams considered "common".
/// `total_ngrams` and `vocab_size` back the Laplace smoothing estimate.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub order: usize,
    pub common_ngrams: HashMap<String, u64>,
    pub total_ngrams: u64,
    pub vocab_size: u64,
}

impl LanguageProfile {
    /// A small built-in English trigram profile seeded with common function
    /// words and letter clusters. Not exhaustive — it exists to give the
    /// Laplace estimator a sane prior, not to model English precisely.
    pub fn english() -> Self {
        let samples = [
            "the quick brown fox jumps over the lazy dog",
            "what is the weather today in san francisco",
            "please summarize this document for me",
            "how do i reset my password and update my account",
            "can you help me write a function that sorts a list",
            "thank you for your help with this request",
            "the meeting is scheduled for tomorrow afternoon",
            "i would like to know more about this topic",
        ];

        let mut common_ngrams: HashMap<String, u64> = HashMap::new();
        let mut total_ngrams = 0u64;

        for sample in samples {
            let chars: Vec<char> = sample.chars().collect();
            if chars.len() < DEFAULT_ORDER {
                continue;
            }
            for window in chars.windows(DEFAULT_ORDER) {
                let gram: String = window.iter().collect();
                *common_ngrams.entry(gram).or_insert(0) += 1;
                total_ngrams += 1;
            }
        }

        let vocab_size = common_ngrams.len() as u64;
        LanguageProfile {
            order: DEFAULT_ORDER,
            common_ngrams,
            total_ngrams,
            vocab_size,
        }
    }

    /// Laplace-smoothed probability of `gram` under this profile.
    fn probability(&self, gram: &str) -> f64 {
        let count = *self.common_ngrams.get(gram).unwrap_or(&0) as f64;
        (count + 1.0) / (self.total_ngrams as f64 + self.vocab_size as f64 + 1.0)
    }

    /// Fraction of a window's n-grams found in `common_ngrams`, used as a
    /// familiarity multiplier: text built from entirely unfamiliar n-grams
    /// is penalized beyond what the smoothed probability alone implies.
    fn familiarity_factor(&self, grams: &[String]) -> f64 {
        if grams.is_empty() {
            return 1.0;
        }
        let hits = grams
            .iter()
            .filter(|g| self.common_ngrams.contains_key(g.as_str()))
            .count();
        let ratio = hits as f64 / grams.len() as f64;
        // Unfamiliar text gets up to a 2x perplexity penalty; fully
        // familiar text is left unscaled.
        1.0 + (1.0 - ratio)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerplexityResult {
    pub perplexity: f64,
    pub anomalous: bool,
    pub window_scores: Vec<f64>,
    pub max_window_perplexity: f64,
}

fn ngrams(chars: &[char], order: usize) -> Vec<String> {
    if chars.len() < order {
        return Vec::new();
    }
    chars
        .windows(order)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Mean negative-log-probability perplexity of `text` under `profile`,
/// scaled by the n-gram familiarity factor.
fn window_perplexity(text: &str, profile: &LanguageProfile) -> f64 {
    let chars: Vec<char> = text.chars().collect();
    let grams = ngrams(&chars, profile.order);
    if grams.is_empty() {
        return 0.0;
    }

    let mean_neg_log_prob = grams
        .iter()
        .map(|g| -profile.probability(g).log2())
        .sum::<f64>()
        / grams.len() as f64;

    mean_neg_log_prob * profile.familiarity_factor(&grams)
}

/// Analyze `text` for anomalous perplexity using a sliding window.
pub fn analyze(
    text: &str,
    profile: &LanguageProfile,
    window: usize,
    threshold: f64,
) -> PerplexityResult {
    let chars: Vec<char> = text.chars().collect();
    let perplexity = window_perplexity(text, profile);

    if chars.len() < profile.order {
        return PerplexityResult {
            perplexity: 0.0,
            anomalous: false,
            window_scores: Vec::new(),
            max_window_perplexity: 0.0,
        };
    }

    let window = window.max(profile.order);
    let window_scores: Vec<f64> = if chars.len() <= window {
        vec![perplexity]
    } else {
        (0..=(chars.len() - window))
            .map(|start| {
                let slice: String = chars[start..start + window].iter().collect();
                window_perplexity(&slice, profile)
            })
            .collect()
    };

    let max_window_perplexity = window_scores.iter().cloned().fold(0.0, f64::max);

    PerplexityResult {
        perplexity,
        anomalous: max_window_perplexity >= threshold,
        window_scores,
        max_window_perplexity,
    }
}

/// Analyze with the spec's default order (3), window (50), and threshold
/// (4.5) against the built-in English profile.
pub fn analyze_default(text: &str) -> PerplexityResult {
    analyze(
        text,
        &LanguageProfile::english(),
        DEFAULT_WINDOW,
        DEFAULT_THRESHOLD,
    )
}
