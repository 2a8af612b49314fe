//! Database operations for the `signals` table.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use sigdex_core::Signal;

use crate::DbError;

/// True if a signal with exactly this `source_url` exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn exists_by_url(pool: &PgPool, source_url: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM signals WHERE source_url = $1)",
    )
    .bind(source_url)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// True if any stored signal carries this `content_hash` in its metadata.
///
/// Uses JSONB containment so the GIN index on `metadata` applies.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn exists_by_content_hash(pool: &PgPool, hash: &str) -> Result<bool, DbError> {
    let needle = serde_json::json!({ "content_hash": hash });
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM signals WHERE metadata @> $1)",
    )
    .bind(needle)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// True if a signal for `company_name` has a title starting with `prefix`,
/// case-insensitively. `ILIKE` metacharacters in the prefix are escaped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn exists_by_title_prefix(
    pool: &PgPool,
    company_name: &str,
    prefix: &str,
) -> Result<bool, DbError> {
    let pattern = format!("{}%", escape_like(prefix));
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM signals WHERE company_name = $1 AND title ILIKE $2)",
    )
    .bind(company_name)
    .bind(pattern)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Insert a signal and return its new id. `user_id = None` creates a shared
/// signal visible to all users.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_signal(
    pool: &PgPool,
    signal: &Signal,
    user_id: Option<Uuid>,
) -> Result<Uuid, DbError> {
    let id = Uuid::new_v4();
    let metadata = Value::Object(signal.metadata.clone());

    sqlx::query(
        "INSERT INTO signals \
             (id, user_id, company_name, company_domain, signal_type, title, summary, \
              source_url, source_name, priority, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(id)
    .bind(user_id)
    .bind(&signal.company_name)
    .bind(&signal.company_domain)
    .bind(signal.signal_type.as_str())
    .bind(&signal.title)
    .bind(&signal.summary)
    .bind(&signal.source_url)
    .bind(&signal.source_name)
    .bind(signal.priority.as_str())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Escape `%`, `_`, and `\` so a user-supplied string matches literally
/// inside an `ILIKE` pattern.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
