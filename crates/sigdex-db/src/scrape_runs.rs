//! Database operations for the `scrape_runs` table.
//!
//! A run moves `pending → running → {completed, failed}`. Rows are created
//! either by the worker itself (scheduled cycle, born `running`) or by an
//! external caller requesting an on-demand run (`pending`, claimed by
//! [`claim_pending_run`]). Terminal transitions are guarded on the current
//! status so a run is finalized exactly once.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Lifecycle status of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Progress status of one source within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Per-source progress entry stored in the run's `progress` JSONB map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProgress {
    pub status: SourceStatus,
    pub signals: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceProgress {
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: SourceStatus::Pending,
            signals: 0,
            error: None,
        }
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    pub total_signals: i64,
    pub ai_enriched: i64,
}

/// A row from the `scrape_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub progress: Value,
    pub total_signals: i32,
    pub ai_enriched_count: i32,
    pub estimated_duration_seconds: Option<i32>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ScrapeRunRow {
    /// Decode the JSONB progress column into the typed map. Unknown or
    /// malformed entries are dropped.
    #[must_use]
    pub fn progress_map(&self) -> BTreeMap<String, SourceProgress> {
        serde_json::from_value(self.progress.clone()).unwrap_or_default()
    }
}

const RUN_COLUMNS: &str = "id, user_id, status, progress, total_signals, ai_enriched_count, \
     estimated_duration_seconds, error_message, started_at, completed_at, created_at";

/// Atomically claim the oldest `pending` run, marking it `running`.
///
/// The inner `FOR UPDATE SKIP LOCKED` select makes the claim safe against a
/// concurrent worker: at most one claimer wins each pending row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn claim_pending_run(pool: &PgPool) -> Result<Option<ScrapeRunRow>, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "UPDATE scrape_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = ( \
             SELECT id FROM scrape_runs \
             WHERE status = 'pending' \
             ORDER BY created_at ASC \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED) \
         RETURNING {RUN_COLUMNS}"
    ))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Create a new run already in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_run(pool: &PgPool, user_id: Option<Uuid>) -> Result<ScrapeRunRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "INSERT INTO scrape_runs (id, user_id, status, progress, started_at) \
         VALUES ($1, $2, 'running', '{{}}'::jsonb, NOW()) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Persist the estimated duration for a run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_estimate(pool: &PgPool, id: Uuid, estimated_secs: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE scrape_runs SET estimated_duration_seconds = $1 WHERE id = $2")
        .bind(i32::try_from(estimated_secs).unwrap_or(i32::MAX))
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Persist the per-source progress map and running totals.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_progress(
    pool: &PgPool,
    id: Uuid,
    progress: &BTreeMap<String, SourceProgress>,
    totals: RunTotals,
) -> Result<(), DbError> {
    let progress_json = serde_json::to_value(progress).unwrap_or(Value::Null);
    sqlx::query(
        "UPDATE scrape_runs \
         SET progress = $1, total_signals = $2, ai_enriched_count = $3 \
         WHERE id = $4",
    )
    .bind(progress_json)
    .bind(i32::try_from(totals.total_signals).unwrap_or(i32::MAX))
    .bind(i32::try_from(totals.ai_enriched).unwrap_or(i32::MAX))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Finalize a run as `completed` with its aggregate counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_run(pool: &PgPool, id: Uuid, totals: RunTotals) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'completed', completed_at = NOW(), \
             total_signals = $1, ai_enriched_count = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(i32::try_from(totals.total_signals).unwrap_or(i32::MAX))
    .bind(i32::try_from(totals.ai_enriched).unwrap_or(i32::MAX))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Finalize a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_run(pool: &PgPool, id: Uuid, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}
