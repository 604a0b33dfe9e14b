//! Forecast store: fetches the raw hourly forecast payload.
//! weather.gov requires a User-Agent on every request.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use crate::parser;
use crate::types::{FetchError, ForecastError, ParsedForecast};

const GEO_JSON: &str = "application/geo+json";

/// Source of raw hourly forecast payloads
pub trait ForecastStore: Send + Sync {
    /// Fetch the hourly forecast as an undecoded JSON string
    fn fetch_hourly_data(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// weather.gov problem document returned with error statuses
#[derive(Debug, Deserialize)]
struct ProblemDetail {
    title: Option<String>,
    detail: Option<String>,
}

/// HTTP store for a weather.gov gridpoint hourly forecast
#[derive(Debug, Clone)]
pub struct NwsForecastStore {
    client: Client,
    forecast_url: String,
}

impl NwsForecastStore {
    pub fn new(
        forecast_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            forecast_url: forecast_url.into(),
        })
    }

    pub fn forecast_url(&self) -> &str {
        &self.forecast_url
    }
}

impl ForecastStore for NwsForecastStore {
    async fn fetch_hourly_data(&self) -> Result<String, FetchError> {
        tracing::debug!("Fetching hourly forecast from {}", self.forecast_url);

        let response = self
            .client
            .get(&self.forecast_url)
            .header(ACCEPT, GEO_JSON)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProblemDetail>(&body)
                .ok()
                .and_then(|p| p.detail.or(p.title))
                .unwrap_or(body);
            tracing::warn!("Forecast request failed with status {}: {}", status, message);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

/// Fetch from `store` and parse the payload against `current_time`.
pub async fn load_forecast<S: ForecastStore>(
    store: &S,
    current_time: DateTime<Utc>,
) -> Result<ParsedForecast, ForecastError> {
    let payload = store.fetch_hourly_data().await?;
    parser::parse_str(&payload, current_time)
}
