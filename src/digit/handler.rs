use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::db::PredictionRecord;
use crate::digit::{self, Classifier, Prediction};
use crate::error::AppError;

/// Multipart field carrying the drawing.
const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub classifier: Arc<dyn Classifier>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PredictResponse {
    Digit(Prediction),
    Rejected { error: String, message: String },
}

impl PredictResponse {
    fn blank() -> Self {
        PredictResponse::Rejected {
            error: "Blank image".to_string(),
            message: "Please draw or upload a digit before predicting".to_string(),
        }
    }
}

pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PredictResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let classifier = Arc::clone(&state.classifier);
    let outcome = tokio::task::spawn_blocking(move || classify_upload(&upload, classifier.as_ref()))
        .await??;

    let Some(prediction) = outcome else {
        tracing::debug!("Rejected blank canvas");
        return Ok(Json(PredictResponse::blank()));
    };

    let record = PredictionRecord::new(&prediction, Utc::now());
    let id = crate::db::insert_prediction(&state.db, &record)
        .await
        .inspect_err(|e| {
            tracing::error!(
                "Prediction {} ({:.4}) was not recorded: {}",
                prediction.digit,
                prediction.confidence,
                e
            )
        })?;

    tracing::info!(
        id,
        digit = prediction.digit,
        confidence = prediction.confidence,
        "Recorded prediction"
    );

    Ok(Json(PredictResponse::Digit(prediction)))
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return field
                .bytes()
                .await
                .map_err(|e| AppError::Upload(e.body_text()));
        }
    }

    Err(AppError::Upload(format!(
        "missing multipart field `{}`",
        UPLOAD_FIELD
    )))
}

/// Decode and classify an upload. `None` means the canvas was blank.
fn classify_upload(
    bytes: &[u8],
    classifier: &dyn Classifier,
) -> Result<Option<Prediction>, AppError> {
    let image = digit::decode(bytes)?;
    if digit::is_blank(&image) {
        return Ok(None);
    }

    let tensor = digit::normalize(&image);
    Ok(Some(classifier.classify(&tensor)?))
}
