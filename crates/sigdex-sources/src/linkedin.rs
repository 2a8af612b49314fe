//! LinkedIn jobs collector via the Bright Data dataset API.
//!
//! Bright Data scrapes asynchronously: a trigger call returns a snapshot id,
//! which is then polled until the snapshot is `ready` (or `failed`, or
//! attempts run out). Without an API token the collector is disabled and
//! returns no signals.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sigdex_core::{Priority, Signal, SignalType};

use crate::{Collector, SourceError, SourceSettings};

const BASE_URL: &str = "https://api.brightdata.com";
const DATASET_ID: &str = "gd_l1viktl72bvl7bjuj0";
const RESULTS_PER_COMPANY: u32 = 25;
const MAX_SUMMARY_PREFIX: usize = 300;

/// Job titles that indicate buying intent.
const SIGNAL_KEYWORDS: &[&str] = &[
    "sales",
    "account executive",
    "business development",
    "vp",
    "director",
    "head of",
    "growth",
    "marketing",
    "enterprise",
    "revenue",
    "partnerships",
];

/// Titles carrying budget authority.
const HIGH_PRIORITY_TITLES: &[&str] = &[
    "vp",
    "vice president",
    "director",
    "head of",
    "chief",
    "cro",
    "cmo",
    "cso",
    "svp",
    "evp",
];

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    #[serde(default)]
    snapshot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    #[serde(default, alias = "job_title")]
    title: Option<String>,
    #[serde(default, alias = "company")]
    company_name: Option<String>,
    #[serde(default, alias = "job_url")]
    url: Option<String>,
    #[serde(default, alias = "job_description")]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

pub struct LinkedInCollector {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    companies: Vec<String>,
    delay_ms: u64,
    poll_max_attempts: u32,
    poll_interval: Duration,
}

impl LinkedInCollector {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &SourceSettings, companies: Vec<String>) -> Result<Self, SourceError> {
        Self::with_base_url(settings, companies, BASE_URL)
    }

    /// Collector with an explicit API base URL (for testing against a mock
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
        if settings.bright_data_api_token.is_none() {
            tracing::warn!(
                "LinkedIn collector disabled: BRIGHT_DATA_API_TOKEN not set"
            );
        }
        Ok(Self {
            client: crate::http_client(settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: settings.bright_data_api_token.clone(),
            companies,
            delay_ms: settings.source_delay_ms,
            poll_max_attempts: settings.poll_max_attempts,
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
        })
    }

    async fn scrape_company(&self, token: &str, company: &str) -> Result<Vec<Signal>, SourceError> {
        let trigger_url = format!("{}/datasets/v3/trigger", self.base_url);
        let payload = json!({
            "dataset_id": DATASET_ID,
            "include_errors": true,
            "limit_multiple_results": RESULTS_PER_COMPANY,
            "notify": false,
            "input": [{"company_name": company, "country": "United States"}],
        });

        let response = self
            .client
            .post(&trigger_url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        match response.status().as_u16() {
            401 => {
                tracing::error!("Bright Data auth failed, check BRIGHT_DATA_API_TOKEN");
                return Ok(Vec::new());
            }
            429 => {
                tracing::warn!(company, "Bright Data rate limited");
                return Ok(Vec::new());
            }
            status if !(200..300).contains(&status) => {
                let body = response.text().await.unwrap_or_default();
                return Err(SourceError::Api(format!(
                    "trigger returned status {status}: {body}"
                )));
            }
            _ => {}
        }

        let trigger: TriggerResponse = response.json().await?;
        let Some(snapshot_id) = trigger.snapshot_id else {
            tracing::warn!(company, "trigger response had no snapshot id");
            return Ok(Vec::new());
        };

        let jobs = self.poll_snapshot(token, &snapshot_id).await?;
        if jobs.is_empty() {
            tracing::info!(company, "no job listings returned");
        }

        Ok(jobs
            .iter()
            .filter_map(|job| parse_job(job, company))
            .collect())
    }

    /// Poll until the snapshot is `ready`, then fetch it. A `failed` status
    /// or exhausted attempts yields an empty result, not an error.
    async fn poll_snapshot(
        &self,
        token: &str,
        snapshot_id: &str,
    ) -> Result<Vec<JobRecord>, SourceError> {
        let progress_url = format!("{}/datasets/v3/progress/{snapshot_id}", self.base_url);
        let data_url = format!("{}/datasets/v3/snapshot/{snapshot_id}", self.base_url);

        for attempt in 1..=self.poll_max_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let response = match self.client.get(&progress_url).bearer_auth(token).send().await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "progress check failed");
                    continue;
                }
            };
            if !response.status().is_success() {
                continue;
            }
            let progress: ProgressResponse = match response.json().await {
                Ok(p) => p,
                Err(_) => continue,
            };

            match progress.status.as_str() {
                "ready" => {
                    let data = self
                        .client
                        .get(&data_url)
                        .bearer_auth(token)
                        .query(&[("format", "json")])
                        .send()
                        .await?;
                    if !data.status().is_success() {
                        return Ok(Vec::new());
                    }
                    return Ok(data.json().await?);
                }
                "failed" => {
                    tracing::error!(snapshot_id, "Bright Data snapshot failed");
                    return Ok(Vec::new());
                }
                status => {
                    tracing::debug!(attempt, status, "snapshot not ready yet");
                }
            }
        }

        tracing::warn!(snapshot_id, "snapshot polling attempts exhausted");
        Ok(Vec::new())
    }
}

fn parse_job(job: &JobRecord, default_company: &str) -> Option<Signal> {
    let title = job.title.as_deref().unwrap_or_default();
    let job_url = job.url.as_deref().unwrap_or_default();
    if title.is_empty() || job_url.is_empty() {
        return None;
    }
    let company_name = job
        .company_name
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(default_company);

    let title_lower = title.to_lowercase();
    if !SIGNAL_KEYWORDS.iter().any(|kw| title_lower.contains(kw)) {
        return None;
    }

    let description = job.description.as_deref().unwrap_or_default();
    let summary = if description.is_empty() {
        format!("New job posting for {title} at {company_name}.")
    } else if description.chars().count() > MAX_SUMMARY_PREFIX {
        let prefix: String = description.chars().take(MAX_SUMMARY_PREFIX).collect();
        format!("{prefix}...")
    } else {
        description.to_string()
    };

    match Signal::new(
        company_name,
        SignalType::Hiring,
        format!("{company_name} is hiring: {title}"),
        summary,
        job_url,
        "LinkedIn",
    ) {
        Ok(mut signal) => {
            signal.priority = assess_priority(&title_lower);
            if let Some(location) = job.location.as_deref().filter(|l| !l.is_empty()) {
                signal
                    .metadata
                    .insert("location".to_string(), location.into());
            }
            signal
                .metadata
                .insert("source_platform".to_string(), "linkedin".into());
            Some(signal)
        }
        Err(e) => {
            tracing::debug!(error = %e, "skipping invalid job record");
            None
        }
    }
}

fn assess_priority(title_lower: &str) -> Priority {
    if HIGH_PRIORITY_TITLES.iter().any(|kw| title_lower.contains(kw)) {
        Priority::High
    } else {
        Priority::Medium
    }
}

#[async_trait]
impl Collector for LinkedInCollector {
    fn name(&self) -> &'static str {
        "linkedin"
    }

    async fn scrape(&self) -> Result<Vec<Signal>, SourceError> {
        let Some(token) = self.api_token.clone() else {
            tracing::warn!("skipping LinkedIn scrape: no API token configured");
            return Ok(Vec::new());
        };

        let mut signals = Vec::new();
        for (i, company) in self.companies.iter().enumerate() {
            if i > 0 {
                crate::jittered_delay(self.delay_ms).await;
            }
            match self.scrape_company(&token, company).await {
                Ok(company_signals) => signals.extend(company_signals),
                Err(e) => {
                    tracing::error!(company, error = %e, "company scrape failed");
                }
            }
        }
        tracing::info!(source = self.name(), count = signals.len(), "scrape complete");
        Ok(signals)
    }
}
