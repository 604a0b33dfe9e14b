//! View-model for the hourly forecast widget.
//!
//! `ForecastModel` is the single writer of the widget state. Readers either
//! use the accessors or subscribe to a `watch` channel that receives a fresh
//! `ForecastSnapshot` after every change.

use std::sync::mpsc;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use skycast_core::AppError;
use skycast_weather::{ForecastStore, HourlyPeriod, Metadata, ParsedForecast};

use crate::services::{self, ForecastServiceError, ForecastServiceMessage};

/// Widget state as seen by the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSnapshot {
    pub loading: bool,
    /// Empty when the last refresh succeeded
    pub error: String,
    pub metadata: Option<Metadata>,
    pub hourly_data: Option<Vec<HourlyPeriod>>,
}

pub struct ForecastModel<S> {
    store: Arc<S>,
    reference_time: Option<DateTime<Utc>>,
    state: ForecastSnapshot,
    last_error: Option<AppError>,
    // Latest fetch started; completions from older fetches are dropped
    generation: u64,
    state_tx: watch::Sender<ForecastSnapshot>,
    service_tx: mpsc::Sender<ForecastServiceMessage>,
    service_rx: mpsc::Receiver<ForecastServiceMessage>,
}

impl<S: ForecastStore + 'static> ForecastModel<S> {
    /// Create a model over `store`.
    ///
    /// `reference_time` decides which periods count as upcoming; `None` uses
    /// the wall clock at parse time.
    pub fn new(store: Arc<S>, reference_time: Option<DateTime<Utc>>) -> Self {
        let (state_tx, _) = watch::channel(ForecastSnapshot::default());
        let (service_tx, service_rx) = mpsc::channel();

        Self {
            store,
            reference_time,
            state: ForecastSnapshot::default(),
            last_error: None,
            generation: 0,
            state_tx,
            service_tx,
            service_rx,
        }
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> &str {
        &self.state.error
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.state.metadata.as_ref()
    }

    pub fn hourly_data(&self) -> Option<&[HourlyPeriod]> {
        self.state.hourly_data.as_deref()
    }

    pub fn snapshot(&self) -> ForecastSnapshot {
        self.state.clone()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<ForecastSnapshot> {
        self.state_tx.subscribe()
    }

    /// Short, non-technical description of the last failure
    pub fn user_message(&self) -> Option<&'static str> {
        self.last_error.as_ref().map(AppError::user_message)
    }

    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.reference_time
    }

    /// Fetch and parse the forecast, updating state in place.
    pub async fn refresh(&mut self) {
        let generation = self.start_fetch();
        let current_time = self.reference_time.unwrap_or_else(Utc::now);

        let result = skycast_weather::load_forecast(self.store.as_ref(), current_time)
            .await
            .map_err(ForecastServiceError::from);

        self.complete(generation, result);
    }

    /// Start a fetch on `runtime` without waiting for it.
    ///
    /// The result is applied by [`ForecastModel::poll_messages`]. Returns the
    /// generation of the started fetch.
    pub fn begin_fetch(&mut self, runtime: &tokio::runtime::Handle) -> u64 {
        let generation = self.start_fetch();
        services::request_fetch(
            &self.service_tx,
            self.store.clone(),
            runtime,
            generation,
            self.reference_time,
        );
        generation
    }

    /// Apply completed background fetches. Returns the number of messages handled.
    pub fn poll_messages(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.service_rx.try_recv() {
            match message {
                ForecastServiceMessage::FetchDone { generation, result } => {
                    self.complete(generation, result);
                }
            }
            handled += 1;
        }
        handled
    }

    fn start_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.state.loading = true;
        self.state.error.clear();
        self.last_error = None;
        self.publish();
        self.generation
    }

    fn complete(
        &mut self,
        generation: u64,
        result: Result<ParsedForecast, ForecastServiceError>,
    ) {
        if generation != self.generation {
            tracing::debug!(
                "Discarding forecast fetch {} superseded by {}",
                generation,
                self.generation
            );
            return;
        }

        match result {
            Ok(forecast) => {
                tracing::info!(
                    "Forecast updated: {} periods generated at {}",
                    forecast.periods.len(),
                    forecast.metadata.generated_on
                );
                self.state.metadata = Some(forecast.metadata);
                self.state.hourly_data = Some(forecast.periods);
            }
            Err(e) => {
                tracing::error!("Failed to load forecast: {}", e);
                self.state.error = e.to_string();
                self.last_error = Some(AppError::from(e));
            }
        }

        self.state.loading = false;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
