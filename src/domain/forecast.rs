use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One hour of the forecast horizon: timestamp plus fused prediction.
/// Points are append-only and never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub predicted_kw: f64,
}

/// The full 24-hour forecast produced by one engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub points: Vec<ForecastPoint>,
}

/// Alert severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
}

/// A forecast hour whose predicted load breaches the configured threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAlert {
    pub timestamp: DateTime<Utc>,
    pub level: AlertLevel,
    pub predicted_kw: f64,
    pub threshold_kw: f64,
    pub message: String,
}

/// Validation metrics of the fitted artifacts, served for KPI cards.
/// Values come from training-side evaluation and are supplied via config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub tree_mape: f64,
    pub sequence_mape: f64,
    pub fusion_mape: f64,
    #[serde(default = "default_mape_unit")]
    pub mape_unit: String,
    pub primary_model: String,
    pub last_trained: NaiveDate,
}

fn default_mape_unit() -> String {
    "%".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_forecast_point_serializes_iso8601() {
        let point = ForecastPoint {
            timestamp: Utc.with_ymd_and_hms(2021, 8, 17, 13, 0, 0).unwrap(),
            predicted_kw: 512.5,
        };

        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("2021-08-17T13:00:00Z"));
        assert!(json.contains("predicted_kw"));
    }

    #[test]
    fn test_alert_level_serializes_lowercase() {
        let json = serde_json::to_string(&AlertLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn test_model_performance_defaults_unit() {
        let perf: ModelPerformance = serde_json::from_str(
            r#"{
                "tree_mape": 40.55,
                "sequence_mape": 49.33,
                "fusion_mape": 30.38,
                "primary_model": "hybrid-fusion",
                "last_trained": "2025-11-15"
            }"#,
        )
        .unwrap();

        assert_eq!(perf.mape_unit, "%");
        assert_eq!(perf.primary_model, "hybrid-fusion");
    }
}
