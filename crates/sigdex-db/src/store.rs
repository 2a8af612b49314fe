//! Storage traits and the Postgres implementation.
//!
//! The orchestrator and the dedup engine are written against these traits so
//! tests can substitute in-memory fakes. [`PgStore`] is the production
//! implementation, delegating to the per-table modules.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use sigdex_core::{ScraperConfig, Signal};

use crate::scrape_runs::{self, RunTotals, ScrapeRunRow, SourceProgress};
use crate::{scraper_config, signals, DbError};

/// Query/insert operations over the `signals` table.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// True if a signal with exactly this `source_url` exists.
    async fn exists_by_url(&self, source_url: &str) -> Result<bool, DbError>;

    /// True if a stored signal's metadata contains this `content_hash`.
    async fn exists_by_content_hash(&self, hash: &str) -> Result<bool, DbError>;

    /// True if a signal for `company_name` has a title starting with
    /// `prefix` (case-insensitive).
    async fn exists_by_title_prefix(
        &self,
        company_name: &str,
        prefix: &str,
    ) -> Result<bool, DbError>;

    /// Insert a signal, returning its new id. `user_id = None` creates a
    /// shared signal visible to all users.
    async fn insert_signal(&self, signal: &Signal, user_id: Option<Uuid>)
        -> Result<Uuid, DbError>;
}

/// Lifecycle operations over the `scrape_runs` table.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Atomically claim the oldest `pending` run, flipping it to `running`.
    /// Returns `None` if no on-demand run is waiting.
    async fn claim_pending_run(&self) -> Result<Option<ScrapeRunRow>, DbError>;

    /// Create a new run already in `running` status.
    async fn create_run(&self, user_id: Option<Uuid>) -> Result<ScrapeRunRow, DbError>;

    /// Persist the estimated duration for a run.
    async fn set_estimate(&self, id: Uuid, estimated_secs: i64) -> Result<(), DbError>;

    /// Persist the per-source progress map and running totals.
    async fn update_progress(
        &self,
        id: Uuid,
        progress: &BTreeMap<String, SourceProgress>,
        totals: RunTotals,
    ) -> Result<(), DbError>;

    /// Finalize a run as `completed` with its aggregate counts.
    async fn complete_run(&self, id: Uuid, totals: RunTotals) -> Result<(), DbError>;

    /// Finalize a run as `failed` with an error message.
    async fn fail_run(&self, id: Uuid, error_message: &str) -> Result<(), DbError>;
}

/// Read access to active scraper configurations.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// All rows with `auto_scrape_enabled = true`, read fresh per cycle.
    async fn load_scraper_configs(&self) -> Result<Vec<ScraperConfig>, DbError>;
}

/// Postgres-backed implementation of all storage traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SignalStore for PgStore {
    async fn exists_by_url(&self, source_url: &str) -> Result<bool, DbError> {
        signals::exists_by_url(&self.pool, source_url).await
    }

    async fn exists_by_content_hash(&self, hash: &str) -> Result<bool, DbError> {
        signals::exists_by_content_hash(&self.pool, hash).await
    }

    async fn exists_by_title_prefix(
        &self,
        company_name: &str,
        prefix: &str,
    ) -> Result<bool, DbError> {
        signals::exists_by_title_prefix(&self.pool, company_name, prefix).await
    }

    async fn insert_signal(
        &self,
        signal: &Signal,
        user_id: Option<Uuid>,
    ) -> Result<Uuid, DbError> {
        signals::insert_signal(&self.pool, signal, user_id).await
    }
}

#[async_trait]
impl RunStore for PgStore {
    async fn claim_pending_run(&self) -> Result<Option<ScrapeRunRow>, DbError> {
        scrape_runs::claim_pending_run(&self.pool).await
    }

    async fn create_run(&self, user_id: Option<Uuid>) -> Result<ScrapeRunRow, DbError> {
        scrape_runs::create_run(&self.pool, user_id).await
    }

    async fn set_estimate(&self, id: Uuid, estimated_secs: i64) -> Result<(), DbError> {
        scrape_runs::set_estimate(&self.pool, id, estimated_secs).await
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: &BTreeMap<String, SourceProgress>,
        totals: RunTotals,
    ) -> Result<(), DbError> {
        scrape_runs::update_progress(&self.pool, id, progress, totals).await
    }

    async fn complete_run(&self, id: Uuid, totals: RunTotals) -> Result<(), DbError> {
        scrape_runs::complete_run(&self.pool, id, totals).await
    }

    async fn fail_run(&self, id: Uuid, error_message: &str) -> Result<(), DbError> {
        scrape_runs::fail_run(&self.pool, id, error_message).await
    }
}

#[async_trait]
impl ConfigStore for PgStore {
    async fn load_scraper_configs(&self) -> Result<Vec<ScraperConfig>, DbError> {
        scraper_config::load_scraper_configs(&self.pool).await
    }
}
