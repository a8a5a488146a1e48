use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::capacity;

/// State for the scrape endpoint, kept apart from [`crate::app_state::AppState`].
#[derive(Clone)]
pub struct MetricsState {
    pub handle: Arc<PrometheusHandle>,
    pub db: PgPool,
}

/// GET /metrics — Prometheus text exposition.
///
/// Job gauges are refreshed before rendering so a scrape never reports counts
/// older than the refresher interval.
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    if let Err(e) = capacity::refresh_job_gauges(&state.db).await {
        tracing::warn!(error = %e, "Serving stale job gauges");
    }

    state.handle.render()
}
