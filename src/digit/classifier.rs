use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tract_onnx::prelude::*;

use super::normalize::ImageTensor;

pub const DIGIT_CLASSES: usize = 10;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("unexpected model output: {0}")]
    Output(String),
}

/// Most likely digit and the probability the model assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub digit: u8,
    pub confidence: f64,
}

pub trait Classifier: Send + Sync {
    /// Probability for each of the ten digit classes.
    fn probabilities(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;

    fn classify(&self, tensor: &ImageTensor) -> Result<Prediction, ClassifierError> {
        let probabilities = self.probabilities(tensor)?;
        top_prediction(&probabilities)
    }
}

/// Argmax over a 10-way distribution; the first index wins ties.
pub fn top_prediction(probabilities: &[f32]) -> Result<Prediction, ClassifierError> {
    if probabilities.len() != DIGIT_CLASSES {
        return Err(ClassifierError::Output(format!(
            "expected {} classes, got {}",
            DIGIT_CLASSES,
            probabilities.len()
        )));
    }
    if let Some(bad) = probabilities.iter().find(|p| !p.is_finite()) {
        return Err(ClassifierError::Output(format!("non-finite probability {}", bad)));
    }
    if let Some(bad) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(ClassifierError::Output(format!("probability {} outside [0, 1]", bad)));
    }

    let mut best = 0;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > probabilities[best] {
            best = i;
        }
    }

    Ok(Prediction {
        digit: best as u8,
        confidence: f64::from(probabilities[best]),
    })
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Pretrained dense network exported to ONNX, optimized once at startup.
pub struct OnnxClassifier {
    plan: OnnxPlan,
}

impl OnnxClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let plan = Self::build_plan(path).map_err(|e| ClassifierError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { plan })
    }

    fn build_plan(path: &Path) -> TractResult<OnnxPlan> {
        let [batch, rows, cols] = ImageTensor::SHAPE;
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(batch, rows, cols)),
            )?
            .into_optimized()?
            .into_runnable()
    }

    fn run(&self, tensor: &ImageTensor) -> TractResult<Vec<f32>> {
        let [batch, rows, cols] = ImageTensor::SHAPE;
        let input: Tensor = tract_ndarray::Array3::from_shape_vec(
            (batch, rows, cols),
            tensor.as_slice().to_vec(),
        )?
        .into();
        let outputs = self.plan.run(tvec!(input.into()))?;
        let scores = outputs[0].to_array_view::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}

impl Classifier for OnnxClassifier {
    fn probabilities(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        self.run(tensor)
            .map_err(|e| ClassifierError::Inference(e.to_string()))
    }
}
