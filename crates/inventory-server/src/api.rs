//! HTTP API: dashboard view model, refresh trigger, health and metrics

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use inventory_lib::{
    health::{ComponentStatus, HealthRegistry},
    FilterChoices, InventoryMetrics, PodFilter, PodRecord, RefreshAck, RefreshCoordinator,
    SnapshotStore,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub coordinator: Arc<RefreshCoordinator>,
    pub health_registry: HealthRegistry,
    pub metrics: InventoryMetrics,
}

impl AppState {
    pub fn new(coordinator: Arc<RefreshCoordinator>, health_registry: HealthRegistry) -> Self {
        Self {
            store: coordinator.store().clone(),
            coordinator,
            health_registry,
            metrics: InventoryMetrics::new(),
        }
    }
}

/// What the dashboard renders for one request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodsView {
    pub generation: u64,
    pub published_at: Option<DateTime<Utc>>,
    /// Records in the snapshot before filtering
    pub total: usize,
    pub filters: PodFilter,
    pub filter_choices: FilterChoices,
    pub pods: Vec<PodRecord>,
}

/// Body of a refresh acknowledgement
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl From<RefreshAck> for RefreshResponse {
    fn from(ack: RefreshAck) -> Self {
        Self {
            status: ack.as_str(),
            message: ack.message(),
        }
    }
}

/// Current snapshot, filtered. Never triggers a refresh.
async fn pods(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<PodFilter>,
) -> Json<PodsView> {
    let snapshot = state.store.current();
    let records = snapshot.records();

    Json(PodsView {
        generation: snapshot.generation,
        published_at: snapshot.published_at,
        total: records.len(),
        filter_choices: FilterChoices::from_records(records),
        pods: filters.apply(records).into_iter().cloned().collect(),
        filters,
    })
}

/// Start a background refresh; answers immediately
async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ack = state.coordinator.trigger_refresh();
    info!(status = ack.as_str(), "Refresh requested over HTTP");
    (StatusCode::ACCEPTED, Json(RefreshResponse::from(ack)))
}

/// 200 while healthy or degraded, 503 when unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/pods", get(pods))
        .route("/api/refresh", post(refresh))
        .route("/refresh-data", get(refresh))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the API until the shutdown signal fires
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
