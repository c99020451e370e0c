//! Adapters around the pre-fitted prediction artifacts.
//!
//! Each adapter is a pure function over its artifact and input: no hidden
//! state, no retries. A failure signals a malformed input shape or feature
//! set, not a transient fault, so callers abort the whole forecast run.

pub mod onnx;
pub mod scaler;

use anyhow::Result;
use ndarray::Array3;

use crate::config::ModelsConfig;
use crate::domain::observation::SEQUENCE_CHANNELS;
use crate::features::TreeFeatures;

pub use onnx::{OnnxFusionModel, OnnxSequenceModel, OnnxTreeModel};
pub use scaler::AffineScaler;

/// Gradient-boosted tree regressor over the fixed 17-field schema.
pub trait TreeRegressor: Send + Sync {
    fn predict(&self, features: &TreeFeatures) -> Result<f64>;
}

/// Recurrent regressor over one scaled `(1, lookback, channels)` tensor.
/// The output stays in the output scaler's units; the caller unscales it.
pub trait SequenceRegressor: Send + Sync {
    fn predict(&self, input: &Array3<f32>) -> Result<f64>;
}

/// Meta-model fusing the two base predictions into the final estimate.
pub trait FusionRegressor: Send + Sync {
    fn predict(&self, tree_kw: f64, sequence_kw: f64) -> Result<f64>;
}

/// Immutable bundle of every artifact the engine needs, loaded once at
/// startup and passed by reference into the engine constructor. Shared
/// read-only across all concurrent forecast runs.
pub struct ModelBundle {
    pub tree: Box<dyn TreeRegressor>,
    pub sequence: Box<dyn SequenceRegressor>,
    pub fusion: Box<dyn FusionRegressor>,
    pub input_scaler: AffineScaler,
    pub output_scaler: AffineScaler,
}

impl ModelBundle {
    /// Load all three ONNX sessions and both scaler parameter files.
    pub fn load(cfg: &ModelsConfig) -> Result<Self> {
        let input_scaler = AffineScaler::from_path(&cfg.input_scaler_path)?;
        if input_scaler.channels() != SEQUENCE_CHANNELS {
            anyhow::bail!(
                "input scaler covers {} channels, sequence model expects {}",
                input_scaler.channels(),
                SEQUENCE_CHANNELS
            );
        }

        let output_scaler = AffineScaler::from_path(&cfg.output_scaler_path)?;
        if output_scaler.channels() != 1 {
            anyhow::bail!(
                "output scaler covers {} channels, expected a single target channel",
                output_scaler.channels()
            );
        }

        Ok(Self {
            tree: Box::new(OnnxTreeModel::load(&cfg.tree_model_path)?),
            sequence: Box::new(OnnxSequenceModel::load(&cfg.sequence_model_path)?),
            fusion: Box::new(OnnxFusionModel::load(&cfg.fusion_model_path)?),
            input_scaler,
            output_scaler,
        })
    }

    /// Assemble a bundle from already-built parts. Used by tests and by any
    /// caller that serves artifacts through a different runtime.
    pub fn from_parts(
        tree: Box<dyn TreeRegressor>,
        sequence: Box<dyn SequenceRegressor>,
        fusion: Box<dyn FusionRegressor>,
        input_scaler: AffineScaler,
        output_scaler: AffineScaler,
    ) -> Self {
        Self {
            tree,
            sequence,
            fusion,
            input_scaler,
            output_scaler,
        }
    }
}
