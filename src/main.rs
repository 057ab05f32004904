mod config;
mod db;
mod digit;
mod error;
mod stats;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::digit::{AppState, OnnxClassifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "digit_analytics=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    tracing::info!(
        "Starting digit analytics on port {} with model {}",
        config.port,
        config.model_path
    );

    if let Some(parent) = std::path::Path::new(config.database_path()).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&format!("{}?mode=rwc", config.database_url))
        .await?;

    db::init_db(&db).await?;
    tracing::info!("Database initialized at {}", config.database_url);

    let classifier = OnnxClassifier::load(&config.model_path)?;
    tracing::info!("Loaded classifier from {}", config.model_path);

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        classifier: Arc::new(classifier),
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("Listening on 0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(stats::index))
        .route("/health", get(stats::health_check))
        .route(
            "/predict",
            post(digit::predict_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Analytics endpoints
        .route("/analytics/total", get(stats::total_predictions))
        .route("/analytics/digit-distribution", get(stats::digit_distribution))
        .route("/analytics/avg-confidence", get(stats::average_confidence))
        .route("/history", get(stats::history))
        .route("/clear_history", delete(stats::clear_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
