//! Liveness surface for the worker daemon.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::RwLock;

const SERVICE_NAME: &str = "sigdex-worker";

/// Shared worker health state. `starting` until the first cycle finishes,
/// then `healthy` or `degraded` depending on the latest cycle outcome.
#[derive(Clone, Default)]
pub struct Health {
    inner: Arc<RwLock<HealthState>>,
}

#[derive(Debug, Clone)]
struct HealthState {
    status: &'static str,
    last_cycle_at: Option<DateTime<Utc>>,
    last_cycle_success: Option<bool>,
    total_signals: u64,
    error_count: u64,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            status: "starting",
            last_cycle_at: None,
            last_cycle_success: None,
            total_signals: 0,
            error_count: 0,
        }
    }
}

/// Point-in-time copy of the health state.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_cycle_success: Option<bool>,
    pub total_signals: u64,
    pub error_count: u64,
}

impl Health {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one cycle.
    pub async fn record_cycle(&self, success: bool, signals: u64) {
        let mut state = self.inner.write().await;
        state.status = if success { "healthy" } else { "degraded" };
        state.last_cycle_at = Some(Utc::now());
        state.last_cycle_success = Some(success);
        if success {
            state.total_signals += signals;
        } else {
            state.error_count += 1;
        }
    }

    /// Mark the worker as shutting down.
    pub async fn set_stopped(&self) {
        self.inner.write().await.status = "stopped";
    }

    pub async fn snapshot(&self) -> HealthSnapshot {
        let state = self.inner.read().await;
        HealthSnapshot {
            status: state.status,
            last_cycle_at: state.last_cycle_at,
            last_cycle_success: state.last_cycle_success,
            total_signals: state.total_signals,
            error_count: state.error_count,
        }
    }
}

/// Router exposing `GET /` (service name) and `GET /health` (JSON state,
/// 503 while degraded).
#[must_use]
pub fn router(health: Health) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_endpoint))
        .with_state(health)
}

async fn root() -> &'static str {
    SERVICE_NAME
}

async fn health_endpoint(State(health): State<Health>) -> impl IntoResponse {
    let snapshot = health.snapshot().await;
    let code = if snapshot.status == "degraded" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = json!({
        "service": SERVICE_NAME,
        "status": snapshot.status,
        "last_cycle_at": snapshot.last_cycle_at,
        "last_cycle_success": snapshot.last_cycle_success,
        "total_signals": snapshot.total_signals,
        "error_count": snapshot.error_count,
    });
    (code, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_in_starting_state() {
        let health = Health::new();
        let snapshot = health.snapshot().await;
        assert_eq!(snapshot.status, "starting");
        assert!(snapshot.last_cycle_at.is_none());
    }

    #[tokio::test]
    async fn successful_cycle_is_healthy_and_accumulates_signals() {
        let health = Health::new();
        health.record_cycle(true, 7).await;
        health.record_cycle(true, 3).await;
        let snapshot = health.snapshot().await;
        assert_eq!(snapshot.status, "healthy");
        assert_eq!(snapshot.total_signals, 10);
        assert_eq!(snapshot.error_count, 0);
    }

    #[tokio::test]
    async fn failed_cycle_degrades_until_next_success() {
        let health = Health::new();
        health.record_cycle(false, 0).await;
        assert_eq!(health.snapshot().await.status, "degraded");
        assert_eq!(health.snapshot().await.error_count, 1);

        health.record_cycle(true, 2).await;
        assert_eq!(health.snapshot().await.status, "healthy");
    }

    #[tokio::test]
    async fn stopped_overrides_status() {
        let health = Health::new();
        health.record_cycle(true, 1).await;
        health.set_stopped().await;
        assert_eq!(health.snapshot().await.status, "stopped");
    }
}
