//! The recursive forecast engine.
//!
//! One engine instance wraps the immutable artifact bundle and serves any
//! number of concurrent forecast runs. Each run owns its working window; the
//! 24 iterations inside a run are strictly sequential because every iteration
//! reads the rows the previous one appended.

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use super::error::{ForecastError, PredictionStage};
use super::windower::SequenceWindower;
use super::{HORIZON_HOURS, LOOKBACK_HOURS, MIN_HISTORY_HOURS};
use crate::domain::{ForecastPoint, HourlyForecast, Observation, WorkingWindow};
use crate::features;
use crate::models::{FusionRegressor, ModelBundle, SequenceRegressor, TreeRegressor};

pub struct ForecastEngine {
    tree: Box<dyn TreeRegressor>,
    sequence: Box<dyn SequenceRegressor>,
    fusion: Box<dyn FusionRegressor>,
    windower: SequenceWindower,
    horizon: usize,
}

impl ForecastEngine {
    /// Build an engine over a loaded artifact bundle with the default
    /// 24-hour horizon.
    pub fn new(bundle: ModelBundle) -> anyhow::Result<Self> {
        Self::with_horizon(bundle, HORIZON_HOURS)
    }

    pub fn with_horizon(bundle: ModelBundle, horizon: usize) -> anyhow::Result<Self> {
        if horizon == 0 {
            anyhow::bail!("forecast horizon must be at least one hour");
        }
        let windower =
            SequenceWindower::new(LOOKBACK_HOURS, bundle.input_scaler, bundle.output_scaler)?;
        Ok(Self {
            tree: bundle.tree,
            sequence: bundle.sequence,
            fusion: bundle.fusion,
            windower,
            horizon,
        })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Run the full recursive forecast over the given history.
    ///
    /// The history must be at least 96 hourly, gap-free rows; both conditions
    /// are checked before any adapter is invoked. Each iteration feeds its
    /// fused prediction back into the window as if it were ground truth, so
    /// errors compound over the horizon by construction - that is the
    /// accepted cost of the recursive scheme, not something to correct here.
    ///
    /// Either all `horizon` points are produced or the run fails as a whole;
    /// a partial autoregressive forecast built on a failed step would be
    /// meaningless.
    pub fn forecast(&self, history: &[Observation]) -> Result<HourlyForecast, ForecastError> {
        let mut window = WorkingWindow::from_history(history.to_vec(), MIN_HISTORY_HOURS)
            .map_err(ForecastError::from_window_error)?;

        let run_id = Uuid::new_v4();
        let mut points = Vec::with_capacity(self.horizon);

        for iteration in 0..self.horizon {
            let features = features::derive_latest(&window);
            let sequence_input = self
                .windower
                .window(&window)
                .map_err(|e| ForecastError::prediction(PredictionStage::Scaling, iteration, e))?;

            let tree_kw = self
                .tree
                .predict(&features)
                .map_err(|e| ForecastError::prediction(PredictionStage::Tree, iteration, e))?;
            let scaled = self
                .sequence
                .predict(&sequence_input)
                .map_err(|e| ForecastError::prediction(PredictionStage::Sequence, iteration, e))?;
            let sequence_kw = self
                .windower
                .unscale_prediction(scaled)
                .map_err(|e| ForecastError::prediction(PredictionStage::Scaling, iteration, e))?;

            let fused_kw = self
                .fusion
                .predict(tree_kw, sequence_kw)
                .map_err(|e| ForecastError::prediction(PredictionStage::Fusion, iteration, e))?;

            let timestamp = window.last().timestamp + Duration::hours(1);
            let synthesized = window.last().carried_forward(timestamp, fused_kw);
            window.append(synthesized);
            points.push(ForecastPoint {
                timestamp,
                predicted_kw: fused_kw,
            });

            debug!(
                %run_id,
                iteration,
                %timestamp,
                tree_kw,
                sequence_kw,
                fused_kw,
                "forecast step"
            );
        }

        Ok(HourlyForecast {
            run_id,
            generated_at: Utc::now(),
            points,
        })
    }
}
