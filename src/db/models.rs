use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::digit::Prediction;

/// A prediction about to be appended to the store. The `id` is assigned on insert.
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub digit: i64,
    pub confidence: f64,
    pub timestamp: String,
}

impl PredictionRecord {
    pub fn new(prediction: &Prediction, timestamp: DateTime<Utc>) -> Self {
        Self {
            digit: i64::from(prediction.digit),
            confidence: prediction.confidence,
            timestamp: timestamp.to_rfc3339(),
        }
    }
}

pub async fn init_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let schema = include_str!("schema.sql");
    sqlx::raw_sql(schema).execute(pool).await?;
    Ok(())
}

pub async fn insert_prediction(
    pool: &SqlitePool,
    record: &PredictionRecord,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO predictions (digit, confidence, timestamp)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(record.digit)
    .bind(record.confidence)
    .bind(&record.timestamp)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn count_predictions(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM predictions")
        .fetch_one(pool)
        .await?;

    row.try_get("total")
}

/// Prediction counts per digit, ascending by digit. Digits never predicted are absent.
pub async fn digit_distribution(pool: &SqlitePool) -> Result<Vec<(i64, i64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT digit, COUNT(*) AS occurrences
        FROM predictions
        GROUP BY digit
        ORDER BY digit
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut distribution = Vec::with_capacity(rows.len());
    for row in rows {
        distribution.push((row.try_get("digit")?, row.try_get("occurrences")?));
    }

    Ok(distribution)
}

/// Mean confidence over all records, `None` when the store is empty.
pub async fn average_confidence(pool: &SqlitePool) -> Result<Option<f64>, sqlx::Error> {
    let row = sqlx::query("SELECT AVG(confidence) AS average_confidence FROM predictions")
        .fetch_one(pool)
        .await?;

    row.try_get("average_confidence")
}

/// `(digit, confidence)` for every record, newest first.
pub async fn prediction_history(pool: &SqlitePool) -> Result<Vec<(i64, f64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT digit, confidence
        FROM predictions
        ORDER BY id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut history = Vec::with_capacity(rows.len());
    for row in rows {
        history.push((row.try_get("digit")?, row.try_get("confidence")?));
    }

    Ok(history)
}

pub async fn clear_predictions(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM predictions").execute(pool).await?;
    Ok(result.rows_affected())
}
