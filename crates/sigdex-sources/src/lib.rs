//! Source collectors: fetch raw business signals from external feeds and
//! APIs.
//!
//! Collectors never touch storage. Each returns the candidate signals it
//! found; deduplication, enrichment, and persistence happen downstream.
//! Partial failures inside a collector (one bad feed, one unparseable item)
//! are logged and skipped rather than failing the whole scrape.

use std::time::Duration;

use async_trait::async_trait;
use sigdex_core::{AppConfig, Signal};
use thiserror::Error;

pub mod classify;
mod google_news;
mod hackernews;
mod linkedin;
mod registry;
pub mod rss;
mod techcrunch;

pub use google_news::GoogleNewsCollector;
pub use hackernews::HackerNewsCollector;
pub use linkedin::LinkedInCollector;
pub use registry::build_collectors;
pub use techcrunch::TechCrunchCollector;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("source API error: {0}")]
    Api(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One scrapeable signal source.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch all candidate signals this source currently offers.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] only when the source is wholly unreachable;
    /// item-level failures are logged and omitted from the result.
    async fn scrape(&self) -> Result<Vec<Signal>, SourceError>;
}

/// HTTP and rate-limit settings shared by every collector.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub source_delay_ms: u64,
    pub bright_data_api_token: Option<String>,
    pub poll_max_attempts: u32,
    pub poll_interval_secs: u64,
}

impl SourceSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout_secs: config.request_timeout_secs,
            source_delay_ms: config.source_delay_ms,
            bright_data_api_token: config.bright_data_api_token.clone(),
            poll_max_attempts: config.poll_max_attempts,
            poll_interval_secs: config.poll_interval_secs,
        }
    }
}

/// Build the shared HTTP client from source settings.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the client cannot be constructed.
pub(crate) fn http_client(settings: &SourceSettings) -> Result<reqwest::Client, SourceError> {
    let client = reqwest::Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Sleep for roughly `base_ms`, jittered to 75-125% to avoid lockstep
/// request patterns against rate-limited hosts.
pub(crate) async fn jittered_delay(base_ms: u64) {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let delay_ms = (base_ms as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}
