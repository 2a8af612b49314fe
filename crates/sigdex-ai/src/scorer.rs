//! Deterministic rule-based priority scorer.
//!
//! Used when AI classification is disabled or comes back below the
//! confidence threshold. Pure: no I/O, no randomness.

use sigdex_core::{Priority, SignalType};

use crate::extract::ExtractedEntities;

/// Publications whose signals get a reliability bonus.
const TRUSTED_SOURCES: &[&str] = &[
    "techcrunch",
    "bloomberg",
    "forbes",
    "wall street journal",
    "reuters",
];

const HIGH_THRESHOLD: i32 = 70;
const MEDIUM_THRESHOLD: i32 = 40;

/// Score a signal's sales priority from its type, extracted entities, and
/// source name.
///
/// Starts at a baseline of 50 (medium) and adjusts for funding size and
/// round, role seniority, C-suite involvement, and source reliability.
#[must_use]
pub fn score_priority(
    signal_type: SignalType,
    entities: &ExtractedEntities,
    source_name: &str,
) -> Priority {
    let mut score: i32 = 50;

    if signal_type == SignalType::Funding {
        let amount = lower(entities.funding_amount.as_deref());
        if contains_any(&amount, &["billion", "100m", "50m"]) {
            score += 30;
        } else if contains_any(&amount, &["series c", "series d", "series e"]) {
            score += 20;
        } else if amount.contains("seed") {
            // Covers both "seed" and "pre-seed".
            score -= 20;
        }
    }

    if signal_type == SignalType::Hiring {
        let role = lower(entities.role_title.as_deref());
        if contains_any(
            &role,
            &["vp", "vice president", "director", "head of", "chief", "cxo"],
        ) {
            score += 25;
        } else if contains_any(&role, &["manager", "lead", "senior"]) {
            score += 10;
        }
    }

    if signal_type == SignalType::LeadershipChange {
        let people = lower(entities.key_people.as_deref());
        if contains_any(&people, &["ceo", "cto", "cfo", "coo", "founder"]) {
            score += 30;
        }
    }

    let source = source_name.to_lowercase();
    if TRUSTED_SOURCES.iter().any(|s| source.contains(s)) {
        score += 10;
    }

    if score >= HIGH_THRESHOLD {
        Priority::High
    } else if score >= MEDIUM_THRESHOLD {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn lower(value: Option<&str>) -> String {
    value.unwrap_or_default().to_lowercase()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(
        funding_amount: Option<&str>,
        role_title: Option<&str>,
        key_people: Option<&str>,
    ) -> ExtractedEntities {
        ExtractedEntities {
            funding_amount: funding_amount.map(str::to_string),
            role_title: role_title.map(str::to_string),
            key_people: key_people.map(str::to_string),
            ..ExtractedEntities::default()
        }
    }

    #[test]
    fn large_funding_from_trusted_source_is_high() {
        let priority = score_priority(
            SignalType::Funding,
            &entities(Some("$100M"), None, None),
            "TechCrunch",
        );
        assert_eq!(priority, Priority::High);
    }

    #[test]
    fn series_c_funding_alone_is_medium() {
        // 50 + 20 = 70 requires the source bonus to reach high.
        let priority = score_priority(
            SignalType::Funding,
            &entities(Some("Series C"), None, None),
            "some blog",
        );
        assert_eq!(priority, Priority::Medium);
    }

    #[test]
    fn series_c_funding_from_trusted_source_is_high() {
        let priority = score_priority(
            SignalType::Funding,
            &entities(Some("Series C"), None, None),
            "Bloomberg",
        );
        assert_eq!(priority, Priority::High);
    }

    #[test]
    fn seed_round_is_penalized() {
        let priority = score_priority(
            SignalType::Funding,
            &entities(Some("pre-seed round"), None, None),
            "some blog",
        );
        assert_eq!(priority, Priority::Low);
    }

    #[test]
    fn junior_hiring_role_stays_medium() {
        let priority = score_priority(
            SignalType::Hiring,
            &entities(None, Some("Account Executive"), None),
            "random blog",
        );
        assert_eq!(priority, Priority::Medium);
    }

    #[test]
    fn vp_hire_is_high() {
        let priority = score_priority(
            SignalType::Hiring,
            &entities(None, Some("VP of Sales"), None),
            "random blog",
        );
        assert_eq!(priority, Priority::High);
    }

    #[test]
    fn senior_hire_is_medium() {
        // 50 + 10 = 60.
        let priority = score_priority(
            SignalType::Hiring,
            &entities(None, Some("Senior Engineer"), None),
            "random blog",
        );
        assert_eq!(priority, Priority::Medium);
    }

    #[test]
    fn ceo_change_is_high() {
        let priority = score_priority(
            SignalType::LeadershipChange,
            &entities(None, None, Some("new CEO")),
            "unknown",
        );
        assert_eq!(priority, Priority::High);
    }

    #[test]
    fn no_entities_is_medium_baseline() {
        let priority = score_priority(
            SignalType::ProductLaunch,
            &ExtractedEntities::default(),
            "unknown",
        );
        assert_eq!(priority, Priority::Medium);
    }

    #[test]
    fn scorer_is_deterministic() {
        let e = entities(Some("$1 billion"), None, None);
        let first = score_priority(SignalType::Funding, &e, "Forbes");
        let second = score_priority(SignalType::Funding, &e, "Forbes");
        assert_eq!(first, second);
    }
}
