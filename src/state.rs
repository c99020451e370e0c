use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::forecast::ForecastEngine;
use crate::history::HistoryStore;
use crate::models::ModelBundle;

/// Shared, immutable application state: the artifact-backed engine and the
/// in-memory history, both loaded once at startup and shared read-only
/// across requests.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub engine: Arc<ForecastEngine>,
    pub history: Arc<HistoryStore>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let history = Arc::new(HistoryStore::from_csv(&cfg.data.history_path)?);

        let bundle = ModelBundle::load(&cfg.models)?;
        let engine = Arc::new(ForecastEngine::with_horizon(
            bundle,
            cfg.forecast.horizon_hours,
        )?);

        Ok(Self {
            cfg,
            engine,
            history,
        })
    }
}
