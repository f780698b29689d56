//! ONNX classifier artifact, executed with tract.

use std::path::Path;

use tract_onnx::prelude::*;

use super::{ClassifierError, ProbabilityModel};
use crate::imaging::{CHANNELS, ImageTensor};

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Optimized, immutable execution plan for an NHWC float image model.
pub struct OnnxModel {
    plan: OnnxPlan,
    input_size: usize,
}

impl OnnxModel {
    /// Parse, pin the input to `[1, size, size, 3]` and optimize.
    pub fn load(path: &Path, input_size: u32) -> Result<Self, ClassifierError> {
        let size = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, size, size, CHANNELS]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| ClassifierError::Load(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            plan,
            input_size: size,
        })
    }
}

impl ProbabilityModel for OnnxModel {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        let shape = input.shape();
        if shape[1] != self.input_size || shape[2] != self.input_size {
            return Err(ClassifierError::Run(format!(
                "input is {}x{}, model expects {}x{}",
                shape[1], shape[2], self.input_size, self.input_size
            )));
        }

        let array = tract_ndarray::Array4::from_shape_vec(
            (shape[0], shape[1], shape[2], shape[3]),
            input.as_slice().to_vec(),
        )
        .map_err(|e| ClassifierError::Run(e.to_string()))?;
        let tensor: Tensor = array.into();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ClassifierError::Run(e.to_string()))?;

        let first = outputs
            .first()
            .ok_or_else(|| ClassifierError::Output("model produced no outputs".to_string()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Output(e.to_string()))?;

        Ok(view.iter().copied().collect())
    }
}
