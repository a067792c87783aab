//! PII detection regexes (part of C9's `pii_detected` violation family).

use regex::Regex;
use std::sync::OnceLock;

use crate::violation::{Violation, ViolationType};

struct PiiRule {
    label: &'static str,
    regex: &'static str,
    /// Extra validation beyond the regex match (e.g. Luhn check).
    validate: fn(&str) -> bool,
}

fn always_valid(_: &str) -> bool {
    true
}

fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 {
        return false;
    }
    let mut sum = 0u32;
    let mut double = false;
    for &d in digits.iter().rev() {
        let mut v = d;
        if double {
            v *= 2;
            if v > 9 {
                v -= 9;
            }
        }
        sum += v;
        double = !double;
    }
    sum % 10 == 0
}

fn not_loopback_ip(candidate: &str) -> bool {
    candidate != "0.0.0.0" && candidate != "127.0.0.1"
}

fn rules() -> &'static [PiiRule] {
    static RULES: OnceLock<Vec<PiiRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            PiiRule {
                label: "SSN",
                regex: r"\b\d{3}-\d{2}-\d{4}\b",
                validate: always_valid,
            },
            PiiRule {
                label: "CREDIT_CARD",
                regex: r"\b(?:\d[ -]?){13,19}\b",
                validate: luhn_valid,
            },
            PiiRule {
                label: "EMAIL",
                regex: r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                validate: always_valid,
            },
            PiiRule {
                label: "PHONE",
                regex: r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b",
                validate: always_valid,
            },
            PiiRule {
                label: "IP_ADDRESS",
                regex: r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
                validate: not_loopback_ip,
            },
            PiiRule {
                label: "PASSPORT",
                regex: r"\b[A-Z]{1,2}\d{6,9}\b",
                validate: always_valid,
            },
            PiiRule {
                label: "DOB",
                regex: r"(?i)(?:date of birth|dob|born on)\D{0,5}(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                validate: always_valid,
            },
            PiiRule {
                label: "IBAN",
                regex: r"\b[A-Z]{2}\d{2}[A-Z0-9]{10,30}\b",
                validate: always_valid,
            },
            PiiRule {
                label: "ROUTING_NUMBER",
                regex: r"(?i)routing\s*(?:number|#)?\D{0,5}(\d{9})\b",
                validate: always_valid,
            },
            PiiRule {
                label: "MRN",
                regex: r"(?i)(?:medical record number|mrn)\D{0,5}([A-Z0-9]{6,12})",
                validate: always_valid,
            },
        ]
    })
}

fn compiled(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in PII pattern must compile")
}

/// Scan `text` for PII, returning one violation per match.
pub fn scan(text: &str) -> Vec<Violation> {
    let mut out = Vec::new();
    for rule in rules() {
        let re = compiled(rule.regex);
        for m in re.find_iter(text) {
            if (rule.validate)(m.as_str()) {
                out.push(Violation::new(
                    ViolationType::PiiDetected,
                    rule.label,
                    m.as_str(),
                ));
            }
        }
    }
    out
}
