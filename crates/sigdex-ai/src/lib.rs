//! AI-assisted enrichment: entity extraction, classification, and the
//! deterministic rule-based fallback scorer.

mod classify;
mod client;
mod enrich;
mod error;
mod extract;
mod scorer;

pub use classify::{classify_signal, validate_classification, Classification, RawClassification};
pub use client::OpenAiClient;
pub use enrich::{apply_classification, Enricher, CONFIDENCE_THRESHOLD};
pub use error::AiError;
pub use extract::{extract_entities, ExtractedEntities};
pub use scorer::score_priority;
