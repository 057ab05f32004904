pub mod models;

pub use models::{
    average_confidence, clear_predictions, count_predictions, digit_distribution, init_db,
    insert_prediction, prediction_history, PredictionRecord,
};
