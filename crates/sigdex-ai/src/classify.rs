//! Stage 2 of enrichment: AI classification of type and priority.

use serde::Deserialize;
use sigdex_core::{Priority, SignalType};

use crate::client::OpenAiClient;
use crate::extract::ExtractedEntities;

const CLASSIFICATION_SYSTEM: &str =
    "You are a signal classification system. Return only valid JSON.";

const CLASSIFICATION_PROMPT: &str = "\
Classify this business signal and assess its sales priority.

Signal:
Title: {title}
Summary: {summary}
Source: {source_name}
Extracted Entities: {entities}

Classification rules:
- hiring: Company is recruiting, especially sales/growth roles
- funding: Company raised investment, new funding round
- expansion: Company entering new markets, opening offices
- partnership: Company forming alliances, integrations
- product_launch: Company releasing new products/features
- leadership_change: New executives, C-suite changes

Priority rules (for sales outreach potential):
- high: Large funding ($50M+), C-suite hires, major expansions, enterprise-focused signals
- medium: Standard funding rounds, director-level hires, product launches
- low: Seed rounds, junior hires, minor updates

Return JSON with exactly these fields:
{\"signal_type\": \"one of the types above\", \"priority\": \"high|medium|low\", \
\"confidence\": 0.0-1.0, \"reasoning\": \"brief explanation\"}";

/// The provider's raw classification payload, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClassification {
    #[serde(default)]
    pub signal_type: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// A validated classification outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub signal_type: SignalType,
    pub priority: Priority,
    pub confidence: f64,
}

impl Classification {
    /// The zero-confidence fallback used when the provider is unavailable
    /// or its response is unusable.
    #[must_use]
    pub fn fallback(signal_type: SignalType, priority: Priority) -> Self {
        Self {
            signal_type,
            priority,
            confidence: 0.0,
        }
    }
}

/// Validate a raw payload against the closed enums.
///
/// Out-of-enum values are replaced by the supplied fallbacks with a warning;
/// a missing confidence defaults to 0.5 and is clamped to `[0, 1]`.
#[must_use]
pub fn validate_classification(
    raw: &RawClassification,
    fallback_type: SignalType,
    fallback_priority: Priority,
) -> Classification {
    let signal_type = match raw.signal_type.as_deref().map(str::parse::<SignalType>) {
        Some(Ok(parsed)) => parsed,
        Some(Err(_)) | None => {
            tracing::warn!(
                received = raw.signal_type.as_deref(),
                using = %fallback_type,
                "invalid signal_type from classifier"
            );
            fallback_type
        }
    };

    let priority = match raw.priority.as_deref().map(str::parse::<Priority>) {
        Some(Ok(parsed)) => parsed,
        Some(Err(_)) | None => {
            tracing::warn!(
                received = raw.priority.as_deref(),
                using = %fallback_priority,
                "invalid priority from classifier"
            );
            fallback_priority
        }
    };

    Classification {
        signal_type,
        priority,
        confidence: raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
    }
}

/// Classify a signal's type and priority with the AI provider.
///
/// Any failure (provider error, timeout, malformed JSON) returns the
/// supplied fallbacks with confidence 0.0 — classification is never fatal.
pub async fn classify_signal(
    client: &OpenAiClient,
    title: &str,
    summary: &str,
    source_name: &str,
    entities: &ExtractedEntities,
    fallback_type: SignalType,
    fallback_priority: Priority,
) -> Classification {
    let entities_json = if entities.is_empty() {
        "None".to_string()
    } else {
        entities.to_json().to_string()
    };
    let prompt = CLASSIFICATION_PROMPT
        .replace("{title}", title)
        .replace("{summary}", summary)
        .replace("{source_name}", source_name)
        .replace("{entities}", &entities_json);

    let raw = match client.chat(CLASSIFICATION_SYSTEM, &prompt, 200).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "classification request failed");
            return Classification::fallback(fallback_type, fallback_priority);
        }
    };

    match serde_json::from_str::<RawClassification>(&raw) {
        Ok(parsed) => {
            let classification =
                validate_classification(&parsed, fallback_type, fallback_priority);
            tracing::info!(
                signal_type = %classification.signal_type,
                priority = %classification.priority,
                confidence = classification.confidence,
                "signal classified"
            );
            classification
        }
        Err(e) => {
            tracing::warn!(error = %e, "classification returned malformed JSON");
            Classification::fallback(fallback_type, fallback_priority)
        }
    }
}
