use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::ModelPerformance;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub models: ModelsConfig,
    pub forecast: ForecastConfig,
    pub alerts: AlertsConfig,
    pub performance: ModelPerformance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub history_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    pub tree_model_path: PathBuf,
    pub sequence_model_path: PathBuf,
    pub fusion_model_path: PathBuf,
    pub input_scaler_path: PathBuf,
    pub output_scaler_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    pub horizon_hours: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    pub critical_load_kw: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("LFS__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_typed_sections() {
        let figment = Figment::from(Toml::string(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            enable_cors = true
            request_timeout_secs = 30

            [data]
            history_path = "data/history.csv"

            [models]
            tree_model_path = "artifacts/tree.onnx"
            sequence_model_path = "artifacts/sequence.onnx"
            fusion_model_path = "artifacts/fusion.onnx"
            input_scaler_path = "artifacts/in.json"
            output_scaler_path = "artifacts/out.json"

            [forecast]
            horizon_hours = 24

            [alerts]
            critical_load_kw = 500.0

            [performance]
            tree_mape = 40.55
            sequence_mape = 49.33
            fusion_mape = 30.38
            primary_model = "hybrid-fusion"
            last_trained = "2025-11-15"
            "#,
        ));

        let cfg: Config = figment.extract().unwrap();
        assert_eq!(cfg.forecast.horizon_hours, 24);
        assert_eq!(cfg.alerts.critical_load_kw, 500.0);
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 8080);
        assert_eq!(cfg.performance.mape_unit, "%");
    }
}
