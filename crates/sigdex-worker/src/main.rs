use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigdex_ai::Enricher;
use sigdex_core::AppConfig;
use sigdex_db::PgStore;
use sigdex_sources::SourceSettings;
use sigdex_worker::{health, Health, Orchestrator};

#[derive(Debug, Parser)]
#[command(name = "sigdex-worker")]
#[command(about = "Business signal ingestion worker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the daemon: health server plus scheduled and on-demand cycles.
    Run,
    /// Execute a single scheduled cycle and exit.
    Once,
    /// Apply pending database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = sigdex_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Migrate => migrate(&config).await,
        Commands::Once => once(&config).await,
        Commands::Run => run(&config).await,
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<sigdex_db::PgPool> {
    let pool_config = sigdex_db::PoolConfig::from_app_config(config);
    let pool = sigdex_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    sigdex_db::run_migrations(&pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}

async fn build_orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator<PgStore>> {
    let pool = connect(config).await?;
    sigdex_db::run_migrations(&pool).await?;

    let enricher = Enricher::from_config(config)?;
    let settings = SourceSettings::from_app_config(config);
    Ok(Orchestrator::with_settings(
        PgStore::new(pool),
        enricher,
        settings,
        config.per_source_estimate_secs,
    ))
}

async fn once(config: &AppConfig) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let summary = orchestrator.run_scheduled().await?;
    tracing::info!(
        run_id = %summary.run_id,
        total_signals = summary.total_signals,
        ai_enriched = summary.ai_enriched,
        "cycle finished"
    );
    Ok(())
}

async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let health_state = Health::new();

    let listener = tokio::net::TcpListener::bind(config.health_bind_addr).await?;
    tracing::info!(addr = %config.health_bind_addr, "health server listening");
    let app = health::router(health_state.clone());
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "health server exited");
        }
    });

    // The first scrape-interval tick fires immediately, giving the startup
    // cycle; subsequent ticks are the schedule.
    let mut scrape_interval =
        tokio::time::interval(Duration::from_secs(config.scrape_interval_minutes * 60));
    let mut pending_interval =
        tokio::time::interval(Duration::from_secs(config.pending_poll_interval_secs));

    loop {
        tokio::select! {
            _ = scrape_interval.tick() => {
                // A waiting on-demand run takes the slot ahead of a fresh
                // scheduled run.
                match orchestrator.run_next().await {
                    Ok(summary) => {
                        let signals = u64::try_from(summary.total_signals).unwrap_or(0);
                        health_state.record_cycle(true, signals).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "scheduled cycle failed");
                        health_state.record_cycle(false, 0).await;
                    }
                }
            }
            _ = pending_interval.tick() => {
                match orchestrator.tick().await {
                    Ok(Some(summary)) => {
                        let signals = u64::try_from(summary.total_signals).unwrap_or(0);
                        health_state.record_cycle(true, signals).await;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "on-demand cycle failed");
                        health_state.record_cycle(false, 0).await;
                    }
                }
            }
            () = shutdown_signal() => {
                health_state.set_stopped().await;
                break;
            }
        }
    }

    server.abort();
    tracing::info!("worker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
