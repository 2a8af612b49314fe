//! Keyword heuristics shared by the collectors.
//!
//! These produce the collector's first-guess classification; enrichment
//! downstream may override it. Matching is ordered: funding keywords win
//! over hiring, and so on down the chain.

use sigdex_core::{Priority, SignalType};

const FUNDING: &[&str] = &[
    "raised",
    "raises",
    "funding",
    "series",
    "seed",
    "investment",
    "valuation",
];
const HIRING: &[&str] = &["hiring", "jobs", "recruit", "talent"];
const EXPANSION: &[&str] = &[
    "expands",
    "expansion",
    "new market",
    "international",
    "opens office",
];
const PARTNERSHIP: &[&str] = &[
    "partnership",
    "partners with",
    "collaborat",
    "acquisition",
    "acquire",
];
const PRODUCT_LAUNCH: &[&str] = &[
    "launches",
    "launch",
    "announces",
    "introduces",
    "introducing",
    "unveils",
    "releases",
    "released",
];
const LEADERSHIP: &[&str] = &["ceo", "cto", "appoints", "joins as", "new head", "executive"];

const HIGH_PRIORITY: &[&str] = &[
    "$100m", "$50m", "billion", "unicorn", "series c", "series d", "ipo", "acquired",
];
const LOW_PRIORITY: &[&str] = &["seed", "pre-seed", "angel", "minor update"];

/// Guess a signal type from free text. `None` means unclassifiable; callers
/// decide whether to skip the item or fall back to a default type.
#[must_use]
pub fn detect_signal_type(text: &str) -> Option<SignalType> {
    let text = text.to_lowercase();
    if contains_any(&text, FUNDING) {
        return Some(SignalType::Funding);
    }
    if contains_any(&text, HIRING) {
        return Some(SignalType::Hiring);
    }
    if contains_any(&text, EXPANSION) {
        return Some(SignalType::Expansion);
    }
    if contains_any(&text, PARTNERSHIP) {
        return Some(SignalType::Partnership);
    }
    if contains_any(&text, PRODUCT_LAUNCH) {
        return Some(SignalType::ProductLaunch);
    }
    if contains_any(&text, LEADERSHIP) {
        return Some(SignalType::LeadershipChange);
    }
    None
}

/// Rule-of-thumb priority from free text. Large rounds and exits score
/// high, seed-stage noise low, everything else medium.
#[must_use]
pub fn assess_priority(text: &str) -> Priority {
    let text = text.to_lowercase();
    if contains_any(&text, HIGH_PRIORITY) {
        Priority::High
    } else if contains_any(&text, LOW_PRIORITY) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
