pub mod classifier;
pub mod handler;
pub mod normalize;

pub use classifier::{Classifier, ClassifierError, OnnxClassifier, Prediction};
pub use handler::{predict_handler, AppState};
pub use normalize::{decode, is_blank, normalize, ImageTensor};
