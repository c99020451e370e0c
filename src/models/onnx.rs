//! ONNX-backed implementations of the model adapter traits.
//!
//! All three artifacts are served through ONNX Runtime sessions loaded once
//! at startup. A session takes exclusive access while running, so each
//! adapter serializes its calls through a mutex; the surrounding bundle is
//! otherwise immutable and safe to share across concurrent forecast runs.

use anyhow::Result;
use ndarray::{Array2, Array3};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::Value;
use parking_lot::Mutex;
use std::path::Path;

use super::{FusionRegressor, SequenceRegressor, TreeRegressor};
use crate::features::{TreeFeatures, TREE_FEATURE_COUNT};

fn load_session(path: &Path) -> Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(1)? // Single-threaded for determinism
        .commit_from_file(path)
        .map_err(|e| anyhow::anyhow!("loading model {}: {e}", path.display()))?;

    if session.inputs.len() != 1 || session.outputs.is_empty() {
        anyhow::bail!(
            "model {} must expose one input and at least one output, found {}/{}",
            path.display(),
            session.inputs.len(),
            session.outputs.len()
        );
    }

    Ok(session)
}

/// Pull the single scalar prediction out of a session's outputs.
fn extract_scalar(outputs: &SessionOutputs, output_name: &str) -> Result<f64> {
    let Some(output) = outputs.get(output_name) else {
        anyhow::bail!("model output '{output_name}' missing from session result");
    };

    let tensor_data = output.try_extract_tensor::<f32>()?;
    let Some(&value) = tensor_data.1.first() else {
        anyhow::bail!("model output '{output_name}' is empty");
    };

    if !value.is_finite() {
        anyhow::bail!("model output '{output_name}' is non-finite: {value}");
    }

    Ok(f64::from(value))
}

/// Gradient-boosted tree regressor.
///
/// The graph consumes one `(1, 17)` row in schema order and must use native
/// missing-value branching: undefined lag/rolling features arrive as NaN.
#[derive(Debug)]
pub struct OnnxTreeModel {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxTreeModel {
    pub fn load(path: &Path) -> Result<Self> {
        let session = load_session(path)?;
        let output_name = session.outputs[0].name.clone();
        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl TreeRegressor for OnnxTreeModel {
    fn predict(&self, features: &TreeFeatures) -> Result<f64> {
        let row: Vec<f32> = features.to_vector().iter().map(|&v| v as f32).collect();
        let input = Array2::from_shape_vec((1, TREE_FEATURE_COUNT), row)?;
        let tensor = Value::from_array(input)?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![tensor])?;
        extract_scalar(&outputs, &self.output_name)
    }
}

/// Recurrent sequence regressor over one scaled `(1, lookback, channels)`
/// tensor. The prediction stays in the output scaler's units.
pub struct OnnxSequenceModel {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxSequenceModel {
    pub fn load(path: &Path) -> Result<Self> {
        let session = load_session(path)?;
        let output_name = session.outputs[0].name.clone();
        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl SequenceRegressor for OnnxSequenceModel {
    fn predict(&self, input: &Array3<f32>) -> Result<f64> {
        let tensor = Value::from_array(input.clone())?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![tensor])?;
        extract_scalar(&outputs, &self.output_name)
    }
}

/// Meta-model over the `(1, 2)` pair of base predictions.
pub struct OnnxFusionModel {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxFusionModel {
    pub fn load(path: &Path) -> Result<Self> {
        let session = load_session(path)?;
        let output_name = session.outputs[0].name.clone();
        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl FusionRegressor for OnnxFusionModel {
    fn predict(&self, tree_kw: f64, sequence_kw: f64) -> Result<f64> {
        let input = Array2::from_shape_vec((1, 2), vec![tree_kw as f32, sequence_kw as f32])?;
        let tensor = Value::from_array(input)?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![tensor])?;
        extract_scalar(&outputs, &self.output_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file_errors_with_path() {
        let err = OnnxTreeModel::load(Path::new("artifacts/does_not_exist.onnx")).unwrap_err();
        assert!(err.to_string().contains("does_not_exist.onnx"));
    }
}
