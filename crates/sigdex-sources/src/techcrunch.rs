//! TechCrunch startup/venture RSS collector.

use async_trait::async_trait;
use regex::Regex;
use sigdex_core::Signal;

use crate::{classify, rss, Collector, SourceError, SourceSettings};

const FEEDS: &[&str] = &[
    "https://techcrunch.com/category/startups/feed/",
    "https://techcrunch.com/category/venture/feed/",
];

const MAX_ITEMS_PER_FEED: usize = 40;

pub struct TechCrunchCollector {
    client: reqwest::Client,
    feeds: Vec<String>,
    company_pattern: Regex,
}

impl TechCrunchCollector {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        Self::with_feeds(settings, FEEDS.iter().map(ToString::to_string).collect())
    }

    /// Collector with explicit feed URLs (for testing against a mock server).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_feeds(
        settings: &SourceSettings,
        feeds: Vec<String>,
    ) -> Result<Self, SourceError> {
        // Headlines lead with the company: "Stripe raises...", "Acme Corp
        // launches...". Take the first one or two capitalized words.
        let company_pattern = Regex::new(r"^([A-Z][a-zA-Z0-9]+(?:\s+[A-Z][a-zA-Z0-9]+)?)")
            .map_err(|e| SourceError::Api(format!("invalid company pattern: {e}")))?;
        Ok(Self {
            client: crate::http_client(settings)?,
            feeds,
            company_pattern,
        })
    }

    fn parse_feed(&self, xml: &str) -> Result<Vec<Signal>, SourceError> {
        let mut signals = Vec::new();
        for item in rss::parse_items(xml, MAX_ITEMS_PER_FEED)? {
            let text = format!("{} {}", item.title, item.description);
            let Some(signal_type) = classify::detect_signal_type(&text) else {
                continue;
            };
            let Some(company) = self.extract_company(&item.title) else {
                continue;
            };

            match Signal::new(
                company,
                signal_type,
                item.title.clone(),
                item.description,
                item.link,
                "TechCrunch",
            ) {
                Ok(mut signal) => {
                    signal.priority = classify::assess_priority(&text);
                    signal
                        .metadata
                        .insert("raw_title".to_string(), item.title.into());
                    signals.push(signal);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping invalid feed item");
                }
            }
        }
        Ok(signals)
    }

    fn extract_company(&self, title: &str) -> Option<String> {
        self.company_pattern
            .captures(title)
            .map(|caps| caps[1].to_string())
    }
}

#[async_trait]
impl Collector for TechCrunchCollector {
    fn name(&self) -> &'static str {
        "techcrunch"
    }

    async fn scrape(&self) -> Result<Vec<Signal>, SourceError> {
        let mut signals = Vec::new();
        for feed_url in &self.feeds {
            let response = match self.client.get(feed_url).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(feed = %feed_url, error = %e, "feed fetch failed");
                    continue;
                }
            };
            if !response.status().is_success() {
                tracing::warn!(
                    feed = %feed_url,
                    status = %response.status(),
                    "feed returned non-success status"
                );
                continue;
            }
            let body = response.text().await?;
            match self.parse_feed(&body) {
                Ok(parsed) => signals.extend(parsed),
                Err(e) => tracing::warn!(feed = %feed_url, error = %e, "feed parse failed"),
            }
        }
        tracing::info!(source = self.name(), count = signals.len(), "scrape complete");
        Ok(signals)
    }
}
