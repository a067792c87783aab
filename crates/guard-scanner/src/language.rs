//! # Language/Script Detector (C5)
//!
//! Classifies each code point into a coarse Unicode script bucket and
//! reports the transitions between non-neutral scripts. Sudden script
//! switching mid-message is a weak but useful signal for smuggled
//! instructions (e.g. Cyrillic homoglyphs the normalizer didn't catch, or
//! a jailbreak payload written in a different script than the surrounding
//! conversation).

use serde::{Deserialize, Serialize};

/// Coarse Unicode script bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    Cyrillic,
    Cjk,
    Arabic,
    Greek,
    Devanagari,
    Thai,
    Hebrew,
    Neutral,
}

/// A point where the active script changed between two non-neutral
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptSwitch {
    /// UTF-16 code-unit index of the switched-to character. Surrogate
    /// pairs (code points above U+FFFF) count as their leading code unit.
    pub position: usize,
    pub from: Script,
    pub to: Script,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageResult {
    pub switches: Vec<ScriptSwitch>,
    /// Most frequent non-neutral script, `None` when the text has none.
    pub primary: Option<Script>,
}

fn classify(c: char) -> Script {
    let cp = c as u32;
    match cp {
        _ if c.is_ascii_digit() || c.is_whitespace() || c.is_ascii_punctuation() => Script::Neutral,
        0x2000..=0x206F => Script::Neutral, // General Punctuation block
        0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => Script::Latin,
        0x0400..=0x04FF => Script::Cyrillic,
        0x0370..=0x03FF => Script::Greek,
        0x0590..=0x05FF => Script::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        0x0E00..=0x0E7F => Script::Thai,
        0x3040..=0x30FF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF => Script::Cjk,
        _ if c.is_alphabetic() => Script::Latin,
        _ => Script::Neutral,
    }
}

/// Analyze `text` for script switches and report the primary script.
pub fn analyze(text: &str) -> LanguageResult {
    let mut switches = Vec::new();
    let mut counts: std::collections::HashMap<Script, usize> = std::collections::HashMap::new();
    let mut last_script: Option<Script> = None;
    let mut utf16_pos = 0usize;

    for c in text.chars() {
        let script = classify(c);
        if script != Script::Neutral {
            *counts.entry(script).or_insert(0) += 1;
            if let Some(prev) = last_script {
                if prev != script {
                    switches.push(ScriptSwitch {
                        position: utf16_pos,
                        from: prev,
                        to: script,
                    });
                }
            }
            last_script = Some(script);
        }
        utf16_pos += c.len_utf16();
    }

    let primary = counts.into_iter().max_by_key(|(_, n)| *n).map(|(s, _)| s);

    LanguageResult { switches, primary }
}
