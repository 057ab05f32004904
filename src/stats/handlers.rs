use axum::{extract::State, response::Html, Json};
use serde_json::json;
use std::sync::Arc;

use crate::digit::AppState;

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

pub async fn total_predictions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, crate::error::AppError> {
    let total = crate::db::count_predictions(&state.db).await?;
    Ok(Json(json!({ "total_predictions": total })))
}

pub async fn digit_distribution(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, crate::error::AppError> {
    let distribution = crate::db::digit_distribution(&state.db).await?;
    Ok(Json(json!({ "distribution": distribution })))
}

pub async fn average_confidence(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, crate::error::AppError> {
    let average = crate::db::average_confidence(&state.db).await?;
    Ok(Json(json!({ "average_confidence": average })))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, crate::error::AppError> {
    let history = crate::db::prediction_history(&state.db).await?;
    Ok(Json(json!({ "history": history })))
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, crate::error::AppError> {
    let deleted = crate::db::clear_predictions(&state.db).await?;
    tracing::info!("Cleared {} predictions", deleted);
    Ok(Json(json!({ "message": "History cleared successfully" })))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "digit_analytics"
    }))
}
