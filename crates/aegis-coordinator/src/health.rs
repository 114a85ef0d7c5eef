//! `/health` and `/metrics` axum surface (§6.7). Deliberately the only
//! HTTP surface the coordinator exposes — no alert ever enters or
//! leaves through it, it only reports on work arriving over NATS.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::pipeline::Coordinator;

/// Process-wide counters the coordinator's consumer loop updates as it
/// drains each pull batch. Cheap, lock-free bookkeeping — exactly what
/// the `/metrics` endpoint needs and nothing more.
#[derive(Default)]
pub struct Metrics {
    pub alerts_consumed: AtomicU64,
    pub alerts_triaged: AtomicU64,
    pub alerts_duplicate: AtomicU64,
    pub alerts_dead_lettered: AtomicU64,
    pub alerts_fallback: AtomicU64,
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub metrics: Arc<Metrics>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "aegis-coordinator",
    }))
}

async fn metrics(axum::extract::State(state): axum::extract::State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "alerts_consumed": state.metrics.alerts_consumed.load(Ordering::Relaxed),
        "alerts_triaged": state.metrics.alerts_triaged.load(Ordering::Relaxed),
        "alerts_duplicate": state.metrics.alerts_duplicate.load(Ordering::Relaxed),
        "alerts_dead_lettered": state.metrics.alerts_dead_lettered.load(Ordering::Relaxed),
        "alerts_fallback": state.metrics.alerts_fallback.load(Ordering::Relaxed),
        "dedup_cache_occupancy": state.coordinator.dedup_cache_occupancy(),
    }))
}
