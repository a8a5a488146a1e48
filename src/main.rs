use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use job_tracker::{
    app_state::AppState,
    config::AppConfig,
    db,
    routes::{self, metrics::MetricsState},
    services::capacity,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing job-tracker");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    metrics::describe_counter!("jobs_created_total", "Total jobs created");
    metrics::describe_counter!("jobs_claimed_total", "Total pending jobs claimed by dispatchers");
    metrics::describe_counter!(
        "job_transitions_total",
        "Accepted job status transitions, by target status"
    );
    metrics::describe_gauge!("jobs_pending", "Jobs waiting to be claimed");
    metrics::describe_gauge!("jobs_in_progress", "Jobs currently processing");

    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let _refresher = capacity::spawn_gauge_refresher(
        db_pool.clone(),
        Duration::from_secs(config.gauge_refresh_secs),
    );

    let metrics_state = MetricsState {
        handle: Arc::new(prometheus_handle),
        db: db_pool.clone(),
    };
    let state = AppState::new(db_pool);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .with_state(state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(metrics_state),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
