//! Reads of the `scraper_config` table.

use std::collections::BTreeMap;

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use sigdex_core::ScraperConfig;

use crate::DbError;

#[derive(Debug, sqlx::FromRow)]
struct ScraperConfigRow {
    user_id: Option<Uuid>,
    target_companies: Vec<String>,
    signal_keywords: Vec<String>,
    sources: Value,
}

/// Load every configuration row with `auto_scrape_enabled = true`.
///
/// Configuration may change between runs, so callers must re-read this at
/// the start of every cycle rather than caching it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_scraper_configs(pool: &PgPool) -> Result<Vec<ScraperConfig>, DbError> {
    let rows = sqlx::query_as::<_, ScraperConfigRow>(
        "SELECT user_id, target_companies, signal_keywords, sources \
         FROM scraper_config \
         WHERE auto_scrape_enabled = TRUE \
         ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ScraperConfig {
            user_id: row.user_id,
            target_companies: row.target_companies,
            signal_keywords: row.signal_keywords,
            sources: decode_sources(&row.sources),
        })
        .collect())
}

/// Decode the `sources` JSONB object into a name → enabled map. Non-boolean
/// values and non-object payloads are ignored.
fn decode_sources(value: &Value) -> BTreeMap<String, bool> {
    let Some(object) = value.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter_map(|(name, v)| v.as_bool().map(|enabled| (name.clone(), enabled)))
        .collect()
}
