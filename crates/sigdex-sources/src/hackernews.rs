//! Hacker News collector: top + new stories via the public Firebase API.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use sigdex_core::{Priority, Signal, SignalType};

use crate::{classify, Collector, SourceError, SourceSettings};

pub(crate) const BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Title keywords that make a story interesting even without a target
/// company match.
const SIGNAL_KEYWORDS: &[&str] = &[
    "hiring",
    "raised",
    "funding",
    "series a",
    "series b",
    "series c",
    "acquired",
    "acquisition",
    "ipo",
    "expansion",
    "launch",
    "partnership",
    "revenue",
    "scaling",
    "enterprise",
    "b2b",
    "saas",
];

const IDS_PER_LIST: usize = 50;
const MAX_STORIES: usize = 75;
const FETCH_CONCURRENCY: usize = 10;

const HIGH_SCORE: i64 = 200;
const MEDIUM_SCORE: i64 = 50;

#[derive(Debug, Deserialize)]
struct Story {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    descendants: i64,
}

pub struct HackerNewsCollector {
    client: reqwest::Client,
    base_url: String,
    companies: Vec<String>,
    keywords: Vec<String>,
}

impl HackerNewsCollector {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &SourceSettings, companies: Vec<String>) -> Result<Self, SourceError> {
        Self::with_base_url(settings, companies, Vec::new(), BASE_URL)
    }

    /// Collector with an explicit API base URL (for testing against a mock
    /// server) and extra user keywords merged into the built-in set.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        settings: &SourceSettings,
        companies: Vec<String>,
        extra_keywords: Vec<String>,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let mut keywords: Vec<String> =
            SIGNAL_KEYWORDS.iter().map(|k| (*k).to_string()).collect();
        for keyword in extra_keywords {
            let lowered = keyword.to_lowercase();
            if !keywords.contains(&lowered) {
                keywords.push(lowered);
            }
        }
        Ok(Self {
            client: crate::http_client(settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            companies: companies.into_iter().map(|c| c.to_lowercase()).collect(),
            keywords,
        })
    }

    async fn story_ids(&self, list: &str) -> Vec<i64> {
        let url = format!("{}/{list}.json", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<i64>>().await {
                    Ok(ids) => ids.into_iter().take(IDS_PER_LIST).collect(),
                    Err(e) => {
                        tracing::warn!(list, error = %e, "story id list parse failed");
                        Vec::new()
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(list, status = %response.status(), "story id list fetch failed");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(list, error = %e, "story id list fetch failed");
                Vec::new()
            }
        }
    }

    async fn fetch_story(&self, id: i64) -> Option<Story> {
        let url = format!("{}/item/{id}.json", self.base_url);
        let response = self.client.get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<Story>().await.ok()
    }

    fn parse_story(&self, story: &Story) -> Option<Signal> {
        if story.title.is_empty() {
            return None;
        }
        let title_lower = story.title.to_lowercase();

        let matched_company = self
            .companies
            .iter()
            .find(|company| title_lower.contains(company.as_str()))
            .map(|company| title_case(company));
        let has_keyword = self
            .keywords
            .iter()
            .any(|keyword| title_lower.contains(keyword.as_str()));
        if matched_company.is_none() && !has_keyword {
            return None;
        }

        let company_name = matched_company.unwrap_or_else(|| "Tech Industry".to_string());
        let signal_type =
            classify::detect_signal_type(&story.title).unwrap_or(SignalType::ProductLaunch);
        let url = story
            .url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", story.id));
        let summary = format!(
            "Trending on Hacker News with {} points. {} comments.",
            story.score, story.descendants
        );

        match Signal::new(
            company_name,
            signal_type,
            story.title.clone(),
            summary,
            url,
            "Hacker News",
        ) {
            Ok(mut signal) => {
                signal.priority = assess_priority(&title_lower, story.score);
                signal.metadata.insert("hn_id".to_string(), story.id.into());
                signal.metadata.insert("score".to_string(), story.score.into());
                signal
                    .metadata
                    .insert("comments".to_string(), story.descendants.into());
                Some(signal)
            }
            Err(e) => {
                tracing::debug!(id = story.id, error = %e, "skipping invalid story");
                None
            }
        }
    }
}

/// High visibility or exit-class keywords score high; modest traction
/// scores medium.
fn assess_priority(title_lower: &str, score: i64) -> Priority {
    if score > HIGH_SCORE {
        return Priority::High;
    }
    if ["raised", "funding", "acquired", "ipo"]
        .iter()
        .any(|kw| title_lower.contains(kw))
    {
        return Priority::High;
    }
    if score > MEDIUM_SCORE {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[async_trait]
impl Collector for HackerNewsCollector {
    fn name(&self) -> &'static str {
        "hackernews"
    }

    async fn scrape(&self) -> Result<Vec<Signal>, SourceError> {
        let top_ids = self.story_ids("topstories").await;
        let new_ids = self.story_ids("newstories").await;

        let mut all_ids = top_ids;
        for id in new_ids {
            if !all_ids.contains(&id) {
                all_ids.push(id);
            }
        }
        all_ids.truncate(MAX_STORIES);

        let stories: Vec<Story> = stream::iter(all_ids)
            .map(|id| self.fetch_story(id))
            .buffer_unordered(FETCH_CONCURRENCY)
            .filter_map(|story| async move { story })
            .collect()
            .await;

        let signals: Vec<Signal> = stories
            .iter()
            .filter_map(|story| self.parse_story(story))
            .collect();
        tracing::info!(source = self.name(), count = signals.len(), "scrape complete");
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(companies: &[&str]) -> HackerNewsCollector {
        let settings = SourceSettings {
            user_agent: "test".to_string(),
            request_timeout_secs: 5,
            source_delay_ms: 0,
            bright_data_api_token: None,
            poll_max_attempts: 1,
            poll_interval_secs: 0,
        };
        HackerNewsCollector::new(
            &settings,
            companies.iter().map(|c| (*c).to_string()).collect(),
        )
        .unwrap()
    }

    fn story(id: i64, title: &str, url: Option<&str>, score: i64) -> Story {
        Story {
            id,
            title: title.to_string(),
            url: url.map(str::to_string),
            score,
            descendants: 12,
        }
    }

    #[test]
    fn target_company_match_is_kept() {
        let signal = collector(&["Stripe"])
            .parse_story(&story(1, "Stripe ships a faster dashboard", Some("https://x.com/a"), 30))
            .expect("company match should be kept");
        assert_eq!(signal.company_name, "Stripe");
        assert_eq!(signal.metadata["hn_id"], 1);
    }

    #[test]
    fn keyword_match_without_company_is_generic() {
        let signal = collector(&["Stripe"])
            .parse_story(&story(2, "Show HN: we raised a Series A", None, 10))
            .expect("keyword match should be kept");
        assert_eq!(signal.company_name, "Tech Industry");
        assert_eq!(signal.source_url, "https://news.ycombinator.com/item?id=2");
        assert_eq!(signal.priority, Priority::High);
    }

    #[test]
    fn unrelated_story_is_dropped() {
        assert!(collector(&["Stripe"])
            .parse_story(&story(3, "A tour of my mechanical keyboard", None, 500))
            .is_none());
    }

    #[test]
    fn score_drives_priority() {
        assert_eq!(assess_priority("quiet story", 500), Priority::High);
        assert_eq!(assess_priority("quiet story", 80), Priority::Medium);
        assert_eq!(assess_priority("quiet story", 5), Priority::Low);
    }
}
