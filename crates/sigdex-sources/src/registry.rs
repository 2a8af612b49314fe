//! Maps the merged enabled-source configuration to concrete collectors.

use sigdex_core::{EffectiveConfig, KNOWN_SOURCES};

use crate::{
    Collector, GoogleNewsCollector, HackerNewsCollector, LinkedInCollector, SourceSettings,
    TechCrunchCollector,
};

/// Fallback target list used when no configuration names any companies.
const DEFAULT_TARGET_COMPANIES: &[&str] = &[
    "Stripe",
    "Shopify",
    "HubSpot",
    "Salesforce",
    "Twilio",
    "Vercel",
    "Supabase",
    "Linear",
    "Notion",
    "Figma",
    "Slack",
    "Zoom",
    "Datadog",
    "Snowflake",
    "MongoDB",
];

/// Build one collector per enabled source, in [`KNOWN_SOURCES`] order.
///
/// A collector that fails to construct is logged and skipped; the cycle
/// proceeds with the remaining sources.
#[must_use]
pub fn build_collectors(
    config: &EffectiveConfig,
    settings: &SourceSettings,
) -> Vec<Box<dyn Collector>> {
    let companies: Vec<String> = if config.target_companies.is_empty() {
        DEFAULT_TARGET_COMPANIES
            .iter()
            .map(|c| (*c).to_string())
            .collect()
    } else {
        config.target_companies.clone()
    };

    let mut collectors: Vec<Box<dyn Collector>> = Vec::new();

    for name in KNOWN_SOURCES {
        if !config.source_enabled(name) {
            continue;
        }
        let built: Result<Box<dyn Collector>, crate::SourceError> = match *name {
            "techcrunch" => {
                TechCrunchCollector::new(settings).map(|c| Box::new(c) as Box<dyn Collector>)
            }
            "google_news" => GoogleNewsCollector::new(settings, companies.clone())
                .map(|c| Box::new(c) as Box<dyn Collector>),
            "hackernews" => HackerNewsCollector::with_base_url(
                settings,
                companies.clone(),
                config.signal_keywords.clone(),
                crate::hackernews::BASE_URL,
            )
            .map(|c| Box::new(c) as Box<dyn Collector>),
            "linkedin" => LinkedInCollector::new(settings, companies.clone())
                .map(|c| Box::new(c) as Box<dyn Collector>),
            other => {
                tracing::warn!(source = other, "unknown source name, skipping");
                continue;
            }
        };
        match built {
            Ok(collector) => collectors.push(collector),
            Err(e) => {
                tracing::error!(source = name, error = %e, "collector construction failed");
            }
        }
    }

    collectors
}
