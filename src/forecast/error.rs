use std::fmt;
use thiserror::Error;

use crate::domain::observation::WindowError;

/// Stage of an iteration at which a prediction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStage {
    Tree,
    Sequence,
    Fusion,
    Scaling,
}

impl fmt::Display for PredictionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => write!(f, "tree"),
            Self::Sequence => write!(f, "sequence"),
            Self::Fusion => write!(f, "fusion"),
            Self::Scaling => write!(f, "scaling"),
        }
    }
}

/// Engine-level failure for one forecast run.
///
/// Every variant carries enough context for the transport layer to pick a
/// response without re-inspecting the run: an upstream-data condition is the
/// caller's problem, everything else aborted the run mid-recursion. There are
/// no retries anywhere - inputs and artifacts are deterministic, so retrying
/// an unchanged run reproduces the same failure.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("historical window too short: {available} of {required} hourly observations")]
    UpstreamDataUnavailable { required: usize, available: usize },

    #[error("feature derivation failed at iteration {iteration}: {reason}")]
    FeatureDerivation { iteration: usize, reason: String },

    #[error("{stage} prediction failed at iteration {iteration}: {cause}")]
    Prediction {
        stage: PredictionStage,
        iteration: usize,
        cause: anyhow::Error,
    },
}

impl ForecastError {
    pub fn prediction(stage: PredictionStage, iteration: usize, cause: anyhow::Error) -> Self {
        Self::Prediction {
            stage,
            iteration,
            cause,
        }
    }

    /// Classify a window-validation failure. A short window is an upstream
    /// data condition; a discontinuous one is a derivation problem found
    /// before iteration 0.
    pub fn from_window_error(err: WindowError) -> Self {
        match err {
            WindowError::TooShort {
                required,
                available,
            } => Self::UpstreamDataUnavailable {
                required,
                available,
            },
            discontinuous @ WindowError::Discontinuous { .. } => Self::FeatureDerivation {
                iteration: 0,
                reason: discontinuous.to_string(),
            },
        }
    }
}
