//! The canonical `Signal` record and its closed vocabularies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum stored summary length, in characters.
pub const MAX_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid signal_type: {0}")]
    InvalidSignalType(String),
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// What kind of business event a signal describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Hiring,
    Funding,
    Expansion,
    Partnership,
    ProductLaunch,
    LeadershipChange,
}

impl SignalType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Hiring => "hiring",
            SignalType::Funding => "funding",
            SignalType::Expansion => "expansion",
            SignalType::Partnership => "partnership",
            SignalType::ProductLaunch => "product_launch",
            SignalType::LeadershipChange => "leadership_change",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignalType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hiring" => Ok(SignalType::Hiring),
            "funding" => Ok(SignalType::Funding),
            "expansion" => Ok(SignalType::Expansion),
            "partnership" => Ok(SignalType::Partnership),
            "product_launch" => Ok(SignalType::ProductLaunch),
            "leadership_change" => Ok(SignalType::LeadershipChange),
            other => Err(ModelError::InvalidSignalType(other.to_string())),
        }
    }
}

/// Sales-outreach priority of a signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ModelError::InvalidPriority(other.to_string())),
        }
    }
}

/// A single detected business event about a company.
///
/// `metadata` is an open key/value map. The orchestrator guarantees a
/// `content_hash` key is present before persistence; enrichment adds
/// `ai_enriched`, `ai_confidence`, and any extracted entity fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_domain: Option<String>,
    pub signal_type: SignalType,
    pub title: String,
    pub summary: String,
    pub source_url: String,
    pub source_name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Signal {
    /// Build a validated signal. The summary is truncated to
    /// [`MAX_SUMMARY_CHARS`] characters.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingField`] if `company_name`, `title`, or
    /// `source_url` is empty after trimming.
    pub fn new(
        company_name: impl Into<String>,
        signal_type: SignalType,
        title: impl Into<String>,
        summary: impl Into<String>,
        source_url: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let company_name = company_name.into();
        let title = title.into();
        let source_url = source_url.into();
        if company_name.trim().is_empty() {
            return Err(ModelError::MissingField("company_name"));
        }
        if title.trim().is_empty() {
            return Err(ModelError::MissingField("title"));
        }
        if source_url.trim().is_empty() {
            return Err(ModelError::MissingField("source_url"));
        }
        let mut summary: String = summary.into();
        if summary.chars().count() > MAX_SUMMARY_CHARS {
            summary = summary.chars().take(MAX_SUMMARY_CHARS).collect();
        }
        Ok(Self {
            company_name,
            company_domain: None,
            signal_type,
            title,
            summary,
            source_url,
            source_name: source_name.into(),
            priority: Priority::default(),
            metadata: Map::new(),
        })
    }

    /// True if enrichment marked this signal as AI-enriched.
    #[must_use]
    pub fn is_ai_enriched(&self) -> bool {
        self.metadata
            .get("ai_enriched")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
