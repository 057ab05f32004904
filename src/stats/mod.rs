pub mod handlers;

pub use handlers::{
    average_confidence, clear_history, digit_distribution, health_check, history, index,
    total_predictions,
};
