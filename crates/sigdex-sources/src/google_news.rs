//! Google News RSS collector: per-company search queries.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use sigdex_core::{Signal, SignalType};

use crate::{classify, rss, Collector, SourceError, SourceSettings};

const BASE_URL: &str = "https://news.google.com";

/// Query templates run per target company; `{}` is the company name.
const QUERIES: &[&str] = &[
    "{} funding raised",
    "{} hiring jobs",
    "{} expansion growth",
    "{} partnership announcement",
    "{} product launch",
];

const MAX_ITEMS_PER_QUERY: usize = 5;
const MAX_TITLE_CHARS: usize = 200;

pub struct GoogleNewsCollector {
    client: reqwest::Client,
    base_url: String,
    companies: Vec<String>,
    delay_ms: u64,
}

impl GoogleNewsCollector {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &SourceSettings, companies: Vec<String>) -> Result<Self, SourceError> {
        Self::with_base_url(settings, companies, BASE_URL)
    }

    /// Collector with an explicit base URL (for testing against a mock
    /// server).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        settings: &SourceSettings,
        companies: Vec<String>,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: crate::http_client(settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            companies,
            delay_ms: settings.source_delay_ms,
        })
    }

    async fn scrape_company(&self, company: &str) -> Vec<Signal> {
        let mut signals = Vec::new();
        for template in QUERIES {
            let query = template.replace("{}", company);
            let encoded = utf8_percent_encode(&query, NON_ALPHANUMERIC).to_string();
            let url = format!(
                "{}/rss/search?q={encoded}&hl=en-US&gl=US&ceid=US:en",
                self.base_url
            );

            let body = match self.fetch(&url).await {
                Ok(Some(body)) => body,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(company, query = %query, error = %e, "query failed");
                    continue;
                }
            };

            match rss::parse_items(&body, MAX_ITEMS_PER_QUERY) {
                Ok(items) => {
                    signals.extend(
                        items
                            .into_iter()
                            .filter_map(|item| parse_item(&item, company)),
                    );
                }
                Err(e) => {
                    tracing::debug!(company, query = %query, error = %e, "feed parse failed");
                }
            }
        }
        signals
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>, SourceError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}

fn parse_item(item: &rss::RssItem, company: &str) -> Option<Signal> {
    if item.title.is_empty() || item.link.is_empty() {
        return None;
    }
    let original_source = item.source.clone().unwrap_or_else(|| "Google News".to_string());
    let title: String = item.title.chars().take(MAX_TITLE_CHARS).collect();
    let summary = format!("News from {original_source}: {title}");

    // Aggregated headlines rarely carry enough context to leave
    // unclassified; default to product_launch and let enrichment refine.
    let signal_type =
        classify::detect_signal_type(&item.title).unwrap_or(SignalType::ProductLaunch);

    match Signal::new(
        company,
        signal_type,
        title,
        summary,
        item.link.clone(),
        format!("Google News ({original_source})"),
    ) {
        Ok(mut signal) => {
            signal.priority = classify::assess_priority(&item.title);
            signal
                .metadata
                .insert("original_source".to_string(), original_source.into());
            Some(signal)
        }
        Err(e) => {
            tracing::debug!(company, error = %e, "skipping invalid news item");
            None
        }
    }
}

#[async_trait]
impl Collector for GoogleNewsCollector {
    fn name(&self) -> &'static str {
        "google_news"
    }

    async fn scrape(&self) -> Result<Vec<Signal>, SourceError> {
        let mut signals = Vec::new();
        for (i, company) in self.companies.iter().enumerate() {
            if i > 0 {
                crate::jittered_delay(self.delay_ms).await;
            }
            signals.extend(self.scrape_company(company).await);
        }
        tracing::info!(source = self.name(), count = signals.len(), "scrape complete");
        Ok(signals)
    }
}
