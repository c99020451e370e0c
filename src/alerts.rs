//! Critical-load alerting over a generated forecast.
//!
//! A thin consumer of the engine's output: each forecast hour whose predicted
//! load exceeds the configured threshold becomes one alert record.

use crate::domain::{AlertLevel, HourlyForecast, LoadAlert};

pub fn check_forecast(forecast: &HourlyForecast, threshold_kw: f64) -> Vec<LoadAlert> {
    forecast
        .points
        .iter()
        .filter(|p| p.predicted_kw > threshold_kw)
        .map(|p| LoadAlert {
            timestamp: p.timestamp,
            level: AlertLevel::Critical,
            predicted_kw: p.predicted_kw,
            threshold_kw,
            message: format!(
                "Predicted load {:.1} kW exceeds {:.0} kW threshold",
                p.predicted_kw, threshold_kw
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastPoint;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn forecast_with(loads: &[f64]) -> HourlyForecast {
        let base = Utc.with_ymd_and_hms(2021, 8, 17, 14, 0, 0).unwrap();
        HourlyForecast {
            run_id: Uuid::new_v4(),
            generated_at: base,
            points: loads
                .iter()
                .enumerate()
                .map(|(i, &predicted_kw)| ForecastPoint {
                    timestamp: base + Duration::hours(i as i64),
                    predicted_kw,
                })
                .collect(),
        }
    }

    #[test]
    fn test_only_breaches_alert() {
        let forecast = forecast_with(&[480.0, 512.5, 499.9, 530.0]);
        let alerts = check_forecast(&forecast, 500.0);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].predicted_kw, 512.5);
        assert_eq!(alerts[1].predicted_kw, 530.0);
        assert!(alerts.iter().all(|a| a.level == AlertLevel::Critical));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let forecast = forecast_with(&[500.0]);
        assert!(check_forecast(&forecast, 500.0).is_empty());
    }

    #[test]
    fn test_message_names_threshold() {
        let forecast = forecast_with(&[512.5]);
        let alerts = check_forecast(&forecast, 500.0);
        assert_eq!(
            alerts[0].message,
            "Predicted load 512.5 kW exceeds 500 kW threshold"
        );
    }
}
