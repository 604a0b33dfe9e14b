pub mod forecast_service;

pub use forecast_service::{request_fetch, ForecastServiceError, ForecastServiceMessage};
