//! The enrichment pipeline: extraction, classification, and confidence
//! gating over a collected signal.

use serde_json::Value;
use sigdex_core::{AppConfig, Signal};

use crate::classify::{classify_signal, Classification};
use crate::client::OpenAiClient;
use crate::error::AiError;
use crate::extract::extract_entities;
use crate::scorer::score_priority;

/// Minimum classifier confidence required to adopt the AI's verdict.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Enriches signals with extracted entities and an AI classification.
///
/// When no provider is configured the enricher still runs, marking each
/// signal `ai_enriched = false` and leaving the collector's classification
/// untouched.
pub struct Enricher {
    client: Option<OpenAiClient>,
}

impl Enricher {
    #[must_use]
    pub fn new(client: Option<OpenAiClient>) -> Self {
        Self { client }
    }

    /// Build from application config. Disabled unless the AI flag is on and
    /// an API key is present.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the HTTP client cannot be constructed or the
    /// configured API base is not a valid URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        if !config.ai_available() {
            tracing::info!("AI enrichment disabled, using rule-based classification only");
            return Ok(Self::new(None));
        }
        let api_key = config
            .openai_api_key
            .as_deref()
            .unwrap_or_default();
        let client = OpenAiClient::new(
            api_key,
            &config.openai_model,
            config.request_timeout_secs,
            config.openai_api_base.as_deref(),
        )?;
        Ok(Self::new(Some(client)))
    }

    #[must_use]
    pub fn ai_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Enrich one signal in place.
    ///
    /// Runs entity extraction, merges the entities into the signal's
    /// metadata, then classifies type and priority. The classification is
    /// only adopted above [`CONFIDENCE_THRESHOLD`]; below it the collector's
    /// type stands and the priority is recomputed by the rule scorer.
    pub async fn enrich(&self, signal: &mut Signal) {
        let Some(client) = &self.client else {
            signal
                .metadata
                .insert("ai_enriched".to_string(), Value::Bool(false));
            return;
        };

        let entities = extract_entities(
            client,
            &signal.title,
            &signal.summary,
            &signal.source_name,
        )
        .await;
        entities.merge_into_metadata(&mut signal.metadata);

        let classification = classify_signal(
            client,
            &signal.title,
            &signal.summary,
            &signal.source_name,
            &entities,
            signal.signal_type,
            signal.priority,
        )
        .await;

        let recomputed = score_priority(signal.signal_type, &entities, &signal.source_name);
        apply_classification(signal, classification, recomputed);
    }
}

/// Apply a classification to a signal under the confidence gate.
///
/// At or above the threshold the AI's type and priority are adopted. Below
/// it the collector's type is kept and `fallback_priority` (the rule
/// scorer's verdict) replaces the priority. Either way the signal is marked
/// enriched and carries the classifier's confidence.
pub fn apply_classification(
    signal: &mut Signal,
    classification: Classification,
    fallback_priority: sigdex_core::Priority,
) {
    if classification.confidence >= CONFIDENCE_THRESHOLD {
        signal.signal_type = classification.signal_type;
        signal.priority = classification.priority;
    } else {
        tracing::debug!(
            confidence = classification.confidence,
            threshold = CONFIDENCE_THRESHOLD,
            "low-confidence classification, keeping collector type"
        );
        signal.priority = fallback_priority;
    }

    signal.metadata.insert(
        "ai_confidence".to_string(),
        serde_json::json!(classification.confidence),
    );
    signal
        .metadata
        .insert("ai_enriched".to_string(), Value::Bool(true));
}
