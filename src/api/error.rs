use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::forecast::ForecastError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Forecast failed: {0}")]
    ForecastFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ForecastFailed(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ServiceUnavailable(_) => "ServiceUnavailable",
            ApiError::ForecastFailed(_) => "ForecastFailed",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match &self {
            ApiError::ForecastFailed(_) | ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::warn!(error = %self, "Service unavailable");
                self.to_string()
            }
            ApiError::BadRequest(_) => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<ForecastError> for ApiError {
    fn from(error: ForecastError) -> Self {
        match error {
            ForecastError::UpstreamDataUnavailable { .. } => {
                ApiError::ServiceUnavailable(error.to_string())
            }
            ForecastError::FeatureDerivation { .. } | ForecastError::Prediction { .. } => {
                ApiError::ForecastFailed(error.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::InternalError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::PredictionStage;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ServiceUnavailable("test".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::ForecastFailed("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_data_maps_to_503() {
        let engine_err = ForecastError::UpstreamDataUnavailable {
            required: 96,
            available: 50,
        };
        let api_err: ApiError = engine_err.into();
        assert_eq!(api_err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_err.error_type(), "ServiceUnavailable");
    }

    #[test]
    fn test_prediction_failure_maps_to_500() {
        let engine_err = ForecastError::prediction(
            PredictionStage::Tree,
            3,
            anyhow::anyhow!("shape mismatch"),
        );
        let api_err: ApiError = engine_err.into();
        assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.error_type(), "ForecastFailed");
    }
}
