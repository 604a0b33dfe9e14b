use crate::services::ForecastServiceError;
use skycast_core::{AppError, WeatherError};

impl From<ForecastServiceError> for AppError {
    fn from(e: ForecastServiceError) -> Self {
        match e {
            ForecastServiceError::Network(e) => AppError::Network(e),
            ForecastServiceError::Api { status: 503, .. } => {
                AppError::Weather(WeatherError::ServiceUnavailable)
            }
            ForecastServiceError::Api { status, message } => {
                AppError::Weather(WeatherError::ApiError(format!("{} - {}", status, message)))
            }
            ForecastServiceError::MalformedPayload(s) => {
                AppError::Weather(WeatherError::MalformedPayload(s))
            }
        }
    }
}
