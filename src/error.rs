use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::digit::ClassifierError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid upload: {0}")]
    Upload(String),

    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Upload(_) => "upload_error",
            AppError::Decode(_) => "decode_error",
            AppError::Classifier(_) => "classifier_error",
            AppError::Database(_) => "database_error",
            AppError::Task(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Upload(_) | AppError::Decode(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Classifier(_) => {
                tracing::error!("Classifier error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Database(_) | AppError::Task(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": self.kind(),
            }
        }));

        (status, body).into_response()
    }
}
