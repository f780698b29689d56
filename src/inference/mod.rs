//! Classifier adapter.
//!
//! The network itself sits behind [`ProbabilityModel`]; this module owns the
//! contract around it: a shared read-only handle injected at startup, arg-max
//! label selection and confidence scaling.
//!
//! ## Ties
//! Arg-max keeps the first maximal index, so an exact 50/50 split yields
//! [`Label::Healthy`] with confidence 50.0.

pub mod onnx;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::account::Label;
use crate::imaging::ImageTensor;

pub use onnx::OnnxModel;

/// Slack allowed on probabilities that land just outside `[0, 1]` from
/// float rounding in the model's softmax.
const PROBABILITY_EPSILON: f32 = 1e-4;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier model is not loaded")]
    Unavailable,

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Model execution failed: {0}")]
    Run(String),

    #[error("Unexpected model output: {0}")]
    Output(String),
}

/// A loaded two-class model. Implementations must be safe to call from many
/// threads at once without mutation.
pub trait ProbabilityModel: Send + Sync {
    /// Probability per class, in [`Label::ALL`] order.
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;
}

/// Selected class and its probability scaled to 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: Label,
    pub confidence: f64,
}

/// Arg-max over exactly two probabilities. No threshold, no abstention.
pub fn select_label(probabilities: &[f32]) -> Result<Classification, ClassifierError> {
    if probabilities.len() != Label::ALL.len() {
        return Err(ClassifierError::Output(format!(
            "expected {} probabilities, got {}",
            Label::ALL.len(),
            probabilities.len()
        )));
    }
    if let Some(bad) = probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < -PROBABILITY_EPSILON || **p > 1.0 + PROBABILITY_EPSILON)
    {
        return Err(ClassifierError::Output(format!(
            "value {} is not a probability",
            bad
        )));
    }

    let mut best = 0;
    for (i, p) in probabilities.iter().enumerate().skip(1) {
        if *p > probabilities[best] {
            best = i;
        }
    }

    let confidence = (f64::from(probabilities[best]) * 100.0).clamp(0.0, 100.0);
    Ok(Classification {
        label: Label::ALL[best],
        confidence,
    })
}

/// Process-wide, read-only classifier handle.
///
/// Cloning shares the same loaded model. A handle built from a failed load
/// stays usable and answers every call with [`ClassifierError::Unavailable`].
#[derive(Clone)]
pub struct ClassifierHandle {
    model: Option<Arc<dyn ProbabilityModel>>,
}

impl ClassifierHandle {
    pub fn new(model: Arc<dyn ProbabilityModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn unavailable() -> Self {
        Self { model: None }
    }

    /// Load the ONNX artifact at `path`. Failure is logged and yields an
    /// unavailable handle instead of aborting startup.
    pub fn load_onnx(path: &Path, input_size: u32) -> Self {
        match OnnxModel::load(path, input_size) {
            Ok(model) => {
                tracing::info!("Classifier model loaded from {}", path.display());
                Self::new(Arc::new(model))
            }
            Err(e) => {
                tracing::error!("Could not load classifier model: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn classify(&self, input: &ImageTensor) -> Result<Classification, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::Unavailable)?;
        let probabilities = model.predict(input)?;
        select_label(&probabilities)
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
