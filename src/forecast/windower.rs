//! Lookback-window extraction for the sequence model.

use anyhow::Result;
use ndarray::Array3;

use crate::domain::observation::SEQUENCE_CHANNELS;
use crate::domain::WorkingWindow;
use crate::models::AffineScaler;

/// Packages the trailing lookback rows into the sequence model's input
/// tensor, applying the fitted input scaler on the way in and inverting the
/// fitted output scaler on the way out.
pub struct SequenceWindower {
    lookback: usize,
    input_scaler: AffineScaler,
    output_scaler: AffineScaler,
}

impl SequenceWindower {
    pub fn new(
        lookback: usize,
        input_scaler: AffineScaler,
        output_scaler: AffineScaler,
    ) -> Result<Self> {
        if input_scaler.channels() != SEQUENCE_CHANNELS {
            anyhow::bail!(
                "input scaler covers {} channels, sequence input has {}",
                input_scaler.channels(),
                SEQUENCE_CHANNELS
            );
        }
        if output_scaler.channels() != 1 {
            anyhow::bail!(
                "output scaler covers {} channels, expected 1",
                output_scaler.channels()
            );
        }
        Ok(Self {
            lookback,
            input_scaler,
            output_scaler,
        })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Extract and scale the last `lookback` rows as a `(1, lookback, 6)`
    /// tensor. The engine's 96-row minimum means this cannot run short in
    /// practice, but the check stays.
    pub fn window(&self, window: &WorkingWindow) -> Result<Array3<f32>> {
        let rows = window.rows();
        if rows.len() < self.lookback {
            anyhow::bail!(
                "sequence lookback needs {} rows, window has {}",
                self.lookback,
                rows.len()
            );
        }

        let tail = &rows[rows.len() - self.lookback..];
        let mut tensor = Array3::<f32>::zeros((1, self.lookback, SEQUENCE_CHANNELS));
        for (i, obs) in tail.iter().enumerate() {
            let scaled = self.input_scaler.transform(&obs.sequence_channels())?;
            for (j, value) in scaled.iter().enumerate() {
                tensor[[0, i, j]] = *value as f32;
            }
        }

        Ok(tensor)
    }

    /// Map the model's scaled scalar output back to physical units.
    pub fn unscale_prediction(&self, scaled: f64) -> Result<f64> {
        Ok(self.output_scaler.inverse(&[scaled])?[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use chrono::{Duration, TimeZone, Utc};

    fn hourly_window(n: usize) -> WorkingWindow {
        let base = Utc.with_ymd_and_hms(2021, 8, 1, 0, 0, 0).unwrap();
        let rows: Vec<Observation> = (0..n)
            .map(|i| Observation {
                timestamp: base + Duration::hours(i as i64),
                current_a: 10.0 + i as f64,
                voltage_v: 230.0,
                frequency_hz: 50.0,
                power_factor: 0.95,
                load_kw: 400.0 + i as f64,
                aux_voltage_v: 229.0,
            })
            .collect();
        WorkingWindow::from_history(rows, 1).unwrap()
    }

    fn identity_scalers() -> (AffineScaler, AffineScaler) {
        (
            AffineScaler::new(vec![1.0; SEQUENCE_CHANNELS], vec![0.0; SEQUENCE_CHANNELS]).unwrap(),
            AffineScaler::new(vec![1.0], vec![0.0]).unwrap(),
        )
    }

    #[test]
    fn test_window_shape_and_ordering() {
        let (input, output) = identity_scalers();
        let windower = SequenceWindower::new(72, input, output).unwrap();
        let tensor = windower.window(&hourly_window(96)).unwrap();

        assert_eq!(tensor.shape(), &[1, 72, SEQUENCE_CHANNELS]);
        // First row of the tensor is the observation 72 hours back (index 24).
        assert_eq!(tensor[[0, 0, 0]], 34.0);
        assert_eq!(tensor[[0, 0, 4]], 424.0);
        // Last row is the newest observation.
        assert_eq!(tensor[[0, 71, 0]], 105.0);
        assert_eq!(tensor[[0, 71, 4]], 495.0);
    }

    #[test]
    fn test_input_scaler_applied_per_channel() {
        let input = AffineScaler::new(
            vec![0.5, 1.0, 1.0, 1.0, 0.001, 1.0],
            vec![0.0, -230.0, 0.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        let (_, output) = identity_scalers();
        let windower = SequenceWindower::new(72, input, output).unwrap();
        let tensor = windower.window(&hourly_window(96)).unwrap();

        assert_eq!(tensor[[0, 71, 0]], 52.5); // 105 * 0.5
        assert_eq!(tensor[[0, 71, 1]], 0.0); // 230 - 230
        assert!((tensor[[0, 71, 4]] - 0.495).abs() < 1e-6);
    }

    #[test]
    fn test_short_window_rejected() {
        let (input, output) = identity_scalers();
        let windower = SequenceWindower::new(72, input, output).unwrap();
        let err = windower.window(&hourly_window(50)).unwrap_err();
        assert!(err.to_string().contains("72"));
    }

    #[test]
    fn test_unscale_prediction_inverts_output_scaler() {
        let (input, _) = identity_scalers();
        let output = AffineScaler::new(vec![2.0], vec![10.0]).unwrap();
        let windower = SequenceWindower::new(72, input, output).unwrap();

        // y = x * 2 + 10, so scaled 1035 maps back to 512.5.
        assert_eq!(windower.unscale_prediction(1035.0).unwrap(), 512.5);
    }

    #[test]
    fn test_wrong_channel_count_rejected_at_construction() {
        let bad_input = AffineScaler::new(vec![1.0; 4], vec![0.0; 4]).unwrap();
        let output = AffineScaler::new(vec![1.0], vec![0.0]).unwrap();
        assert!(SequenceWindower::new(72, bad_input, output).is_err());
    }
}
