//! HTTP API: Prometheus scrape endpoint plus health probes

use crate::{
    health::{components, ComponentStatus, HealthRegistry},
    metrics::{HostMetrics, CONTENT_TYPE},
    observability::StructuredLogger,
    sampler::{SampleError, Sampler},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: HostMetrics,
    pub sampler: Sampler,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: HostMetrics,
        sampler: Sampler,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            sampler,
            logger,
        }
    }
}

/// Why a scrape produced no metrics
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Sample the host, update the gauges and serialize the registry.
///
/// Gauges are written only after the sample fully succeeded, so a failed
/// scrape leaves the previous values in place.
async fn scrape(state: &AppState) -> Result<String, ScrapeError> {
    let started = Instant::now();

    let sample = match state.sampler.sample().await {
        Ok(sample) => sample,
        Err(e) => {
            state
                .health_registry
                .record_failure(components::SAMPLER, e.to_string())
                .await;
            return Err(e.into());
        }
    };
    state
        .health_registry
        .record_success(components::SAMPLER)
        .await;

    state.metrics.apply(&sample);

    let body = match state.metrics.encode() {
        Ok(body) => body,
        Err(e) => {
            state
                .health_registry
                .record_failure(components::REGISTRY, e.to_string())
                .await;
            return Err(e.into());
        }
    };
    state
        .health_registry
        .record_success(components::REGISTRY)
        .await;

    state.logger.log_scrape(started.elapsed(), &sample);
    Ok(body)
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ScrapeError> {
    let started = Instant::now();

    match scrape(&state).await {
        Ok(body) => Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body)),
        Err(e) => {
            state.logger.log_scrape_failure(started.elapsed(), &e);
            Err(e)
        }
    }
}

/// 200 while every component is healthy, 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
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

/// Create the API router. Panicking handlers are answered with a 500.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
