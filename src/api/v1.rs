use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Instant;

use crate::{
    alerts,
    api::{error::ApiError, response::ApiResponse},
    domain::{HourlyForecast, LoadAlert, ModelPerformance, Observation},
    forecast::MIN_HISTORY_HOURS,
    history::{daily_means, MAX_CHART_ROWS},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/forecast/hourly", get(get_hourly_forecast))
        .route("/alerts/check", get(check_alerts))
        .route("/data/historical", get(get_historical_data))
        .route("/model/performance", get(get_model_performance))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

/// Run one recursive forecast over the latest history slice. The engine is
/// synchronous and makes 24 sequential model calls, so it runs on the
/// blocking pool; the router's timeout layer bounds the wait.
async fn run_forecast(state: &AppState) -> Result<HourlyForecast, ApiError> {
    let engine = state.engine.clone();
    let history = state.history.clone();

    let result =
        tokio::task::spawn_blocking(move || engine.forecast(history.tail(MIN_HISTORY_HOURS)))
            .await
            .map_err(|e| ApiError::InternalError(format!("forecast task failed: {e}")))?;

    Ok(result?)
}

/// GET /api/v1/forecast/hourly - run the full recursive 24-hour forecast
pub async fn get_hourly_forecast(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HourlyForecast>>, ApiError> {
    let started = Instant::now();
    let forecast = run_forecast(&state).await?;
    let count = forecast.points.len();

    Ok(Json(
        ApiResponse::success(forecast)
            .with_count(count)
            .with_duration(started.elapsed().as_millis() as u64),
    ))
}

/// GET /api/v1/alerts/check - compare the upcoming forecast against the
/// critical-load threshold
pub async fn check_alerts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LoadAlert>>>, ApiError> {
    let forecast = run_forecast(&state).await?;
    let alerts = alerts::check_forecast(&forecast, state.cfg.alerts.critical_load_kw);
    let count = alerts.len();

    Ok(Json(ApiResponse::success(alerts).with_count(count)))
}

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// GET /api/v1/data/historical - serve historical observations for charts.
/// Responses larger than the chart limit are downsampled to daily means.
pub async fn get_historical_data(
    State(state): State<AppState>,
    Query(q): Query<HistoricalQuery>,
) -> Result<Json<ApiResponse<Vec<Observation>>>, ApiError> {
    let start = q
        .start
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());
    // Inclusive end-of-day bound; observations sit on the hour.
    let end = q
        .end
        .map(|d| d.and_time(NaiveTime::MIN).and_utc() + Duration::hours(23));

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(ApiError::BadRequest(
                "start date must not be after end date".to_string(),
            ));
        }
    }

    let mut rows = state.history.range(start, end);
    if rows.len() > MAX_CHART_ROWS {
        rows = daily_means(&rows);
    }
    let count = rows.len();

    Ok(Json(ApiResponse::success(rows).with_count(count)))
}

/// GET /api/v1/model/performance - validation metrics for the KPI cards
pub async fn get_model_performance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ModelPerformance>>, ApiError> {
    Ok(Json(ApiResponse::success(state.cfg.performance.clone())))
}
