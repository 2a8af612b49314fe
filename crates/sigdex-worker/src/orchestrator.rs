//! The ingestion cycle: collect, enrich, dedup, persist, checkpoint.
//!
//! One orchestrator serves every active user per cycle: scraper configs are
//! merged fresh at the start of each run, collectors execute sequentially,
//! and the run record is checkpointed after every source so an observer can
//! watch progress mid-run. The orchestrator is the single writer of its run
//! record.

use std::collections::BTreeMap;

use sigdex_ai::Enricher;
use sigdex_core::{merge_configs, EffectiveConfig, Signal};
use sigdex_db::scrape_runs::{RunTotals, ScrapeRunRow, SourceProgress, SourceStatus};
use sigdex_db::{dedup, ConfigStore, DbError, RunStore, SignalStore};
use sigdex_sources::{build_collectors, Collector, SourceSettings};
use uuid::Uuid;

/// Builds the collector set for a cycle from the merged configuration.
pub type CollectorFactory =
    Box<dyn Fn(&EffectiveConfig) -> Vec<Box<dyn Collector>> + Send + Sync>;

/// Outcome of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub run_id: Uuid,
    pub total_signals: i64,
    pub ai_enriched: i64,
    pub failed_sources: Vec<String>,
}

pub struct Orchestrator<S> {
    store: S,
    enricher: Enricher,
    collector_factory: CollectorFactory,
    per_source_estimate_secs: u64,
}

impl<S> Orchestrator<S>
where
    S: SignalStore + RunStore + ConfigStore,
{
    pub fn new(
        store: S,
        enricher: Enricher,
        collector_factory: CollectorFactory,
        per_source_estimate_secs: u64,
    ) -> Self {
        Self {
            store,
            enricher,
            collector_factory,
            per_source_estimate_secs,
        }
    }

    /// Orchestrator with the production collector registry.
    pub fn with_settings(
        store: S,
        enricher: Enricher,
        settings: SourceSettings,
        per_source_estimate_secs: u64,
    ) -> Self {
        let factory: CollectorFactory =
            Box::new(move |config| build_collectors(config, &settings));
        Self::new(store, enricher, factory, per_source_estimate_secs)
    }

    /// Claim and execute at most one pending on-demand run.
    ///
    /// Returns `None` when nothing is waiting. The claim is atomic, so
    /// concurrent workers never execute the same run twice.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the claim fails or a cycle-level storage
    /// operation fails; the run is marked `failed` best-effort first.
    pub async fn tick(&self) -> Result<Option<CycleSummary>, DbError> {
        let Some(run) = self.store.claim_pending_run().await? else {
            return Ok(None);
        };
        tracing::info!(run_id = %run.id, "claimed pending on-demand run");
        self.run_cycle(run).await.map(Some)
    }

    /// Create and execute a fresh scheduled run.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if run creation or a cycle-level storage
    /// operation fails.
    pub async fn run_scheduled(&self) -> Result<CycleSummary, DbError> {
        let run = self.store.create_run(None).await?;
        tracing::info!(run_id = %run.id, "starting scheduled run");
        self.run_cycle(run).await
    }

    /// Execute the next due cycle: a waiting on-demand run if one exists,
    /// otherwise a fresh scheduled run. On-demand requests are never left
    /// queued behind a new scheduled run.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the executed cycle fails at the storage level.
    pub async fn run_next(&self) -> Result<CycleSummary, DbError> {
        if let Some(summary) = self.tick().await? {
            return Ok(summary);
        }
        self.run_scheduled().await
    }

    async fn run_cycle(&self, run: ScrapeRunRow) -> Result<CycleSummary, DbError> {
        let run_id = run.id;
        match self.execute(&run).await {
            Ok(summary) => {
                tracing::info!(
                    run_id = %run_id,
                    total_signals = summary.total_signals,
                    ai_enriched = summary.ai_enriched,
                    failed_sources = summary.failed_sources.len(),
                    "run completed"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "run failed");
                if let Err(mark_err) = self.store.fail_run(run_id, &e.to_string()).await {
                    tracing::error!(
                        run_id = %run_id,
                        error = %mark_err,
                        "could not mark run as failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, run: &ScrapeRunRow) -> Result<CycleSummary, DbError> {
        let configs = self.store.load_scraper_configs().await?;
        let merged = merge_configs(&configs);
        let collectors = (self.collector_factory)(&merged);

        if collectors.is_empty() {
            tracing::warn!(run_id = %run.id, "no sources enabled, completing empty run");
            self.store.complete_run(run.id, RunTotals::default()).await?;
            return Ok(CycleSummary {
                run_id: run.id,
                total_signals: 0,
                ai_enriched: 0,
                failed_sources: Vec::new(),
            });
        }

        let estimate = collectors.len() as u64 * self.per_source_estimate_secs;
        self.store
            .set_estimate(run.id, i64::try_from(estimate).unwrap_or(i64::MAX))
            .await?;

        let mut progress: BTreeMap<String, SourceProgress> = collectors
            .iter()
            .map(|c| (c.name().to_string(), SourceProgress::pending()))
            .collect();
        let mut totals = RunTotals::default();
        self.store.update_progress(run.id, &progress, totals).await?;

        let mut failed_sources = Vec::new();
        for collector in &collectors {
            let name = collector.name();
            set_status(&mut progress, name, SourceStatus::Running);
            self.store.update_progress(run.id, &progress, totals).await?;

            match collector.scrape().await {
                Ok(candidates) => {
                    let (inserted, enriched) =
                        self.persist_candidates(candidates, run.user_id).await;
                    totals.total_signals += inserted;
                    totals.ai_enriched += enriched;
                    if let Some(entry) = progress.get_mut(name) {
                        entry.status = SourceStatus::Completed;
                        entry.signals = inserted;
                    }
                }
                Err(e) => {
                    tracing::error!(source = name, error = %e, "source scrape failed");
                    failed_sources.push(name.to_string());
                    if let Some(entry) = progress.get_mut(name) {
                        entry.status = SourceStatus::Failed;
                        entry.signals = 0;
                        entry.error = Some(e.to_string());
                    }
                }
            }
            self.store.update_progress(run.id, &progress, totals).await?;
        }

        self.store.complete_run(run.id, totals).await?;
        Ok(CycleSummary {
            run_id: run.id,
            total_signals: totals.total_signals,
            ai_enriched: totals.ai_enriched,
            failed_sources,
        })
    }

    /// Enrich, dedup, and insert each candidate. Returns (inserted,
    /// ai-enriched) counts. Candidate-level failures never abort the batch:
    /// dedup store errors allow the candidate through, insert errors drop
    /// it.
    async fn persist_candidates(
        &self,
        candidates: Vec<Signal>,
        user_id: Option<Uuid>,
    ) -> (i64, i64) {
        let mut inserted = 0;
        let mut enriched = 0;

        for mut signal in candidates {
            self.enricher.enrich(&mut signal).await;
            dedup::ensure_content_hash(&mut signal);

            match dedup::is_duplicate(
                &self.store,
                &signal.title,
                &signal.company_name,
                &signal.source_url,
            )
            .await
            {
                Ok(true) => {
                    tracing::debug!(
                        company = %signal.company_name,
                        url = %signal.source_url,
                        "skipping duplicate signal"
                    );
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        url = %signal.source_url,
                        "dedup check failed, allowing signal through"
                    );
                }
            }

            match self.store.insert_signal(&signal, user_id).await {
                Ok(_) => {
                    inserted += 1;
                    if signal.is_ai_enriched() {
                        enriched += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        company = %signal.company_name,
                        "signal insert failed, dropping"
                    );
                }
            }
        }

        (inserted, enriched)
    }
}

fn set_status(
    progress: &mut BTreeMap<String, SourceProgress>,
    name: &str,
    status: SourceStatus,
) {
    if let Some(entry) = progress.get_mut(name) {
        entry.status = status;
    }
}
