//! Pre-fitted affine scalers for the sequence model.
//!
//! The training pipeline fits min-max scalers and exports them as per-channel
//! affine parameters (`y = x * scale + offset`). The serving side treats them
//! as opaque transforms; it never refits anything.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffineScaler {
    scale: Vec<f64>,
    offset: Vec<f64>,
}

impl AffineScaler {
    pub fn new(scale: Vec<f64>, offset: Vec<f64>) -> Result<Self> {
        if scale.len() != offset.len() {
            anyhow::bail!(
                "scaler parameter count mismatch: {} scale entries, {} offset entries",
                scale.len(),
                offset.len()
            );
        }
        if scale.is_empty() {
            anyhow::bail!("scaler must cover at least one channel");
        }
        if let Some(bad) = scale.iter().find(|s| !s.is_finite() || **s == 0.0) {
            anyhow::bail!("scaler scale entries must be finite and non-zero, got {bad}");
        }
        Ok(Self { scale, offset })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading scaler {}: {e}", path.display()))?;
        let parsed: Self = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing scaler {}: {e}", path.display()))?;
        Self::new(parsed.scale, parsed.offset)
    }

    pub fn channels(&self) -> usize {
        self.scale.len()
    }

    /// Apply the fitted transform to one row of channel values.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.channels() {
            anyhow::bail!(
                "scaler expects {} channels, got {}",
                self.channels(),
                values.len()
            );
        }
        Ok(values
            .iter()
            .zip(self.scale.iter().zip(self.offset.iter()))
            .map(|(v, (s, o))| v * s + o)
            .collect())
    }

    /// Invert the fitted transform, mapping scaled values back to physical units.
    pub fn inverse(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.channels() {
            anyhow::bail!(
                "scaler expects {} channels, got {}",
                self.channels(),
                values.len()
            );
        }
        Ok(values
            .iter()
            .zip(self.scale.iter().zip(self.offset.iter()))
            .map(|(v, (s, o))| (v - o) / s)
            .collect())
    }
}
