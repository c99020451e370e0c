//! Feature derivation for the tree model.
//!
//! Derives the calendar, lag and rolling-average features for the *latest*
//! row of a working window. The engine re-derives this every iteration from
//! the updated window, because lag and rolling fields depend on the rows
//! appended by earlier iterations.

use chrono::{Datelike, Timelike};

use crate::domain::{Observation, WorkingWindow};
use crate::features::schema::TreeFeatures;

/// Lag offsets over the target channel, in hours.
pub const LAG_HOURS: [usize; 3] = [1, 3, 24];

/// Trailing rolling-average windows over the target channel, in hours.
pub const ROLLING_HOURS: [usize; 3] = [3, 6, 24];

/// Derive the feature vector for the last timestamp in the window.
///
/// Lag `k` is the target value exactly `k` hours earlier. A rolling average
/// of width `w` is the mean of the `w` values ending at the *previous* hour;
/// the observation at the feature's own timestamp is never included, so the
/// value being predicted cannot leak into its own inputs. Either field is
/// `None` when fewer than `k` (or `w`) prior rows exist.
pub fn derive_latest(window: &WorkingWindow) -> TreeFeatures {
    let rows = window.rows();
    let last = window.last();
    let ts = last.timestamp;

    TreeFeatures {
        current_a: last.current_a,
        voltage_v: last.voltage_v,
        frequency_hz: last.frequency_hz,
        power_factor: last.power_factor,
        aux_voltage_v: last.aux_voltage_v,
        hour: ts.hour(),
        day_of_week: ts.weekday().num_days_from_monday(),
        month: ts.month(),
        quarter: ts.month0() / 3 + 1,
        year: ts.year(),
        day_of_year: ts.ordinal(),
        load_lag_1h: lag(rows, LAG_HOURS[0]),
        load_lag_3h: lag(rows, LAG_HOURS[1]),
        load_lag_24h: lag(rows, LAG_HOURS[2]),
        load_roll_avg_3h: trailing_mean(rows, ROLLING_HOURS[0]),
        load_roll_avg_6h: trailing_mean(rows, ROLLING_HOURS[1]),
        load_roll_avg_24h: trailing_mean(rows, ROLLING_HOURS[2]),
    }
}

/// Target value `k` rows before the last one.
fn lag(rows: &[Observation], k: usize) -> Option<f64> {
    let prior = rows.len() - 1;
    if prior < k {
        return None;
    }
    Some(rows[prior - k].load_kw)
}

/// Mean of the `w` target values ending one row before the last.
fn trailing_mean(rows: &[Observation], w: usize) -> Option<f64> {
    let prior = rows.len() - 1;
    if prior < w {
        return None;
    }
    let sum: f64 = rows[prior - w..prior].iter().map(|o| o.load_kw).sum();
    Some(sum / w as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn window_from_loads(loads: &[f64]) -> WorkingWindow {
        let base = Utc.with_ymd_and_hms(2021, 8, 13, 14, 0, 0).unwrap();
        let rows: Vec<Observation> = loads
            .iter()
            .enumerate()
            .map(|(i, &load_kw)| Observation {
                timestamp: base + Duration::hours(i as i64),
                current_a: 12.0,
                voltage_v: 231.5,
                frequency_hz: 50.0,
                power_factor: 0.94,
                load_kw,
                aux_voltage_v: 229.8,
            })
            .collect();
        WorkingWindow::from_history(rows, 1).unwrap()
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 400.0 + i as f64).collect()
    }

    #[test]
    fn test_calendar_fields() {
        // Base 2021-08-13 14:00 UTC is a Friday; 95 hours later is
        // 2021-08-17 13:00 UTC, a Tuesday.
        let features = derive_latest(&window_from_loads(&ramp(96)));

        assert_eq!(features.hour, 13);
        assert_eq!(features.day_of_week, 1);
        assert_eq!(features.month, 8);
        assert_eq!(features.quarter, 3);
        assert_eq!(features.year, 2021);
        assert_eq!(features.day_of_year, 229);
    }

    #[test]
    fn test_lag_values() {
        let features = derive_latest(&window_from_loads(&ramp(96)));

        // Last row carries load 495; lags index strictly backwards from it.
        assert_eq!(features.load_lag_1h, Some(494.0));
        assert_eq!(features.load_lag_3h, Some(492.0));
        assert_eq!(features.load_lag_24h, Some(471.0));
    }

    #[test]
    fn test_rolling_means_exclude_current_row() {
        let features = derive_latest(&window_from_loads(&ramp(96)));

        // Mean of the w values ending at the previous hour.
        assert_eq!(features.load_roll_avg_3h, Some(493.0));
        assert_eq!(features.load_roll_avg_6h, Some(491.5));
        assert_eq!(features.load_roll_avg_24h, Some(482.5));
    }

    #[test]
    fn test_short_history_leaves_fields_missing() {
        // 24 rows: 23 hours of prior target history.
        let features = derive_latest(&window_from_loads(&ramp(24)));

        assert_eq!(features.load_lag_24h, None);
        assert_eq!(features.load_roll_avg_24h, None);
        assert_eq!(features.load_lag_3h, Some(420.0));
        assert_eq!(features.load_roll_avg_6h, Some(419.5));
    }

    #[test]
    fn test_latest_target_value_never_leaks() {
        let loads = ramp(96);
        let mut mutated = loads.clone();
        *mutated.last_mut().unwrap() = 9999.0;

        let original = derive_latest(&window_from_loads(&loads));
        let changed = derive_latest(&window_from_loads(&mutated));

        assert_eq!(original, changed);
    }

    proptest! {
        #[test]
        fn prop_features_invariant_to_last_target(
            loads in proptest::collection::vec(100.0f64..1000.0, 25..120),
            replacement in -1.0e6f64..1.0e6,
        ) {
            let mut mutated = loads.clone();
            *mutated.last_mut().unwrap() = replacement;

            let original = derive_latest(&window_from_loads(&loads));
            let changed = derive_latest(&window_from_loads(&mutated));

            prop_assert_eq!(original, changed);
        }
    }
}
