//! Stage 1 of enrichment: structured entity extraction.

use serde_json::{Map, Value};

use crate::client::OpenAiClient;
use crate::error::AiError;

const EXTRACTION_SYSTEM: &str =
    "You are an entity extraction system. Return only valid JSON.";

const EXTRACTION_PROMPT: &str = "\
Extract structured entities from this business signal. Return JSON only.

Signal:
Title: {title}
Summary: {summary}
Source: {source_name}

Extract these fields (use null if not found):
- company_name: The primary company this signal is about
- funding_amount: Dollar amount if funding mentioned (e.g., \"$50M\", \"$100 million\")
- funding_round: Series A, B, C, Seed, etc.
- role_title: Job title if hiring signal
- key_people: Names of executives/founders mentioned
- industry: Company's industry/sector
- location: Geographic location if mentioned

Return ONLY valid JSON, no markdown formatting.";

/// Entities extracted from a signal's text. All fields optional; an empty
/// set is the non-fatal failure value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    pub company_name: Option<String>,
    pub funding_amount: Option<String>,
    pub funding_round: Option<String>,
    pub role_title: Option<String>,
    pub key_people: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
}

impl ExtractedEntities {
    /// Parse the provider's JSON payload. Fields may arrive as strings or
    /// as arrays of strings (`key_people` in particular); arrays are joined
    /// with `", "`. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Json`] if the payload is not a JSON object.
    pub fn from_json(raw: &str) -> Result<Self, AiError> {
        let object: Map<String, Value> =
            serde_json::from_str(raw).map_err(|e| AiError::Json {
                context: "entity extraction payload".to_string(),
                source: e,
            })?;

        Ok(Self {
            company_name: string_field(&object, "company_name"),
            funding_amount: string_field(&object, "funding_amount"),
            funding_round: string_field(&object, "funding_round"),
            role_title: string_field(&object, "role_title"),
            key_people: string_field(&object, "key_people"),
            industry: string_field(&object, "industry"),
            location: string_field(&object, "location"),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }

    /// Number of populated fields.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.fields().iter().filter(|(_, v)| v.is_some()).count()
    }

    /// Merge populated fields into signal metadata. Extracted values win on
    /// key collision.
    pub fn merge_into_metadata(&self, metadata: &mut Map<String, Value>) {
        for (key, value) in self.fields() {
            if let Some(v) = value {
                metadata.insert((*key).to_string(), Value::String(v.clone()));
            }
        }
    }

    /// JSON rendering used inside the classification prompt.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in self.fields() {
            if let Some(v) = value {
                object.insert((*key).to_string(), Value::String(v.clone()));
            }
        }
        Value::Object(object)
    }

    fn fields(&self) -> [(&'static str, &Option<String>); 7] {
        [
            ("company_name", &self.company_name),
            ("funding_amount", &self.funding_amount),
            ("funding_round", &self.funding_round),
            ("role_title", &self.role_title),
            ("key_people", &self.key_people),
            ("industry", &self.industry),
            ("location", &self.location),
        ]
    }
}

/// Read a field that may be a string, a number, or an array of strings.
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let joined: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join(", "))
            }
        }
        _ => None,
    }
}

/// Extract structured entities from a signal's text.
///
/// Any failure (provider error, timeout, malformed JSON) returns an empty
/// entity set with a warning — extraction is never fatal to the pipeline.
pub async fn extract_entities(
    client: &OpenAiClient,
    title: &str,
    summary: &str,
    source_name: &str,
) -> ExtractedEntities {
    let prompt = EXTRACTION_PROMPT
        .replace("{title}", title)
        .replace("{summary}", summary)
        .replace("{source_name}", source_name);

    match client.chat(EXTRACTION_SYSTEM, &prompt, 500).await {
        Ok(raw) => match ExtractedEntities::from_json(&raw) {
            Ok(entities) => {
                tracing::info!(
                    company = entities.company_name.as_deref(),
                    fields = entities.populated(),
                    "entities extracted"
                );
                entities
            }
            Err(e) => {
                tracing::warn!(error = %e, "entity extraction returned malformed JSON");
                ExtractedEntities::default()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "entity extraction failed");
            ExtractedEntities::default()
        }
    }
}
