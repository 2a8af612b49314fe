//! Per-user scraper configuration and the cross-user merge.
//!
//! Each user row carries its own target companies, signal keywords, and
//! source toggles. One ingestion cycle serves every active user at once, so
//! the orchestrator merges all rows into a single [`EffectiveConfig`] at the
//! start of each cycle. Configuration is re-read every cycle, never cached.

use std::collections::BTreeMap;

use uuid::Uuid;

/// Source names the registry knows how to build, in registry order.
pub const KNOWN_SOURCES: &[&str] = &["techcrunch", "google_news", "hackernews", "linkedin"];

/// One user's scraper configuration. `user_id = None` is the shared/system
/// configuration row.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub user_id: Option<Uuid>,
    pub target_companies: Vec<String>,
    pub signal_keywords: Vec<String>,
    pub sources: BTreeMap<String, bool>,
}

/// The merged view of every active [`ScraperConfig`] for one cycle.
#[derive(Debug, Clone, Default)]
pub struct EffectiveConfig {
    pub target_companies: Vec<String>,
    pub signal_keywords: Vec<String>,
    pub sources: BTreeMap<String, bool>,
}

impl EffectiveConfig {
    /// True if the named source is enabled by at least one user.
    #[must_use]
    pub fn source_enabled(&self, name: &str) -> bool {
        self.sources.get(name).copied().unwrap_or(false)
    }

    /// Number of enabled sources.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.sources.values().filter(|enabled| **enabled).count()
    }
}

/// Merge all active configurations into one effective target list and
/// enabled-source set.
///
/// Companies and keywords are unioned preserving first-seen order, deduped
/// case-insensitively. A source is enabled if ANY config enables it; every
/// name in [`KNOWN_SOURCES`] appears in the output map.
#[must_use]
pub fn merge_configs(configs: &[ScraperConfig]) -> EffectiveConfig {
    let mut merged = EffectiveConfig {
        sources: KNOWN_SOURCES
            .iter()
            .map(|name| ((*name).to_string(), false))
            .collect(),
        ..EffectiveConfig::default()
    };

    for config in configs {
        union_into(&mut merged.target_companies, &config.target_companies);
        union_into(&mut merged.signal_keywords, &config.signal_keywords);
        for (name, enabled) in &config.sources {
            if *enabled {
                merged.sources.insert(name.clone(), true);
            } else {
                merged.sources.entry(name.clone()).or_insert(false);
            }
        }
    }

    merged
}

fn union_into(acc: &mut Vec<String>, items: &[String]) {
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        let already = acc.iter().any(|seen| seen.eq_ignore_ascii_case(trimmed));
        if !already {
            acc.push(trimmed.to_string());
        }
    }
}
