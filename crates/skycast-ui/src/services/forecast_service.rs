//! Forecast backend: async forecast fetching.
//! Network work runs on the tokio runtime; results are sent back via mpsc.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use skycast_core::{NetworkError, ReqwestErrorExt};
use skycast_weather::{FetchError, ForecastError, ForecastStore, ParsedForecast};

/// Error type for forecast operations
#[derive(Debug)]
pub enum ForecastServiceError {
    Network(NetworkError),
    Api { status: u16, message: String },
    MalformedPayload(String),
}

impl std::fmt::Display for ForecastServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastServiceError::Network(e) => write!(f, "Error getting hourly data... {}", e),
            ForecastServiceError::Api { status, message } => {
                write!(f, "Error getting hourly data... HTTP {}: {}", status, message)
            }
            ForecastServiceError::MalformedPayload(s) => {
                write!(f, "Error reading hourly data... {}", s)
            }
        }
    }
}

impl std::error::Error for ForecastServiceError {}

impl From<ForecastError> for ForecastServiceError {
    fn from(e: ForecastError) -> Self {
        match e {
            ForecastError::Fetch(FetchError::Network(e)) => {
                ForecastServiceError::Network(e.into_network_error())
            }
            ForecastError::Fetch(FetchError::Status { status, message }) => {
                ForecastServiceError::Api { status, message }
            }
            ForecastError::MalformedPayload(s) => ForecastServiceError::MalformedPayload(s),
        }
    }
}

/// Messages sent from async operations back to the model
#[derive(Debug)]
pub enum ForecastServiceMessage {
    /// Result of fetching and parsing the hourly forecast
    FetchDone {
        generation: u64,
        result: Result<ParsedForecast, ForecastServiceError>,
    },
}

/// Request to fetch the hourly forecast asynchronously.
/// Sends `FetchDone` on the channel when complete.
///
/// `reference_time` of `None` means the wall clock when the task starts.
pub fn request_fetch<S: ForecastStore + 'static>(
    tx: &std::sync::mpsc::Sender<ForecastServiceMessage>,
    store: Arc<S>,
    runtime: &tokio::runtime::Handle,
    generation: u64,
    reference_time: Option<DateTime<Utc>>,
) {
    let tx = tx.clone();

    runtime.spawn(async move {
        let current_time = reference_time.unwrap_or_else(Utc::now);
        let result = skycast_weather::load_forecast(store.as_ref(), current_time)
            .await
            .map_err(ForecastServiceError::from);

        if tx
            .send(ForecastServiceMessage::FetchDone { generation, result })
            .is_err()
        {
            tracing::debug!("Forecast model dropped before fetch {} completed", generation);
        }
    });
}
