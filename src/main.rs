use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use skycast_ui::{split_time, ForecastModel, HourlyPeriod, SplitTime};
use skycast_weather::{ForecastStore, NwsForecastStore};

/// Icon for the widget: the three highlighted categories, else the category's own icon
fn icon_for(period: &HourlyPeriod) -> &'static str {
    if period.is_sunny() {
        "sun"
    } else if period.is_partly_sunny() {
        "cloud_sun"
    } else if period.is_somewhat_cloudy() {
        "cloud"
    } else {
        period.forecast_type.map(|c| c.icon_name()).unwrap_or("unknown")
    }
}

fn display_time(time: &str) -> String {
    match split_time(time) {
        SplitTime::Parts { clock, meridiem } => format!("{:>5} {}", clock, meridiem),
        SplitTime::Unmatched(raw) => raw.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let (config, _) = skycast_core::Config::load_validated()?;
    let reference_time = config.weather.reference_instant()?;

    let store = NwsForecastStore::new(
        config.weather.forecast_url.clone(),
        &config.weather.user_agent,
        Duration::from_secs(config.weather.request_timeout_secs),
    )
    .context("Failed to create forecast client")?;

    tracing::info!("SkyCast fetching {}", store.forecast_url());

    let mut model = ForecastModel::new(Arc::new(store), reference_time);
    model.refresh().await;

    report(&model)
}

/// Print the refreshed forecast, or the error and fail so scripts see it
fn report<S: ForecastStore + 'static>(model: &ForecastModel<S>) -> Result<()> {
    if !model.error().is_empty() {
        eprintln!("{}", model.error());
        if let Some(message) = model.user_message() {
            eprintln!("{}", message);
        }
        anyhow::bail!("Forecast refresh failed");
    }

    if let Some(metadata) = model.metadata() {
        println!("Forecast generated {}", metadata.generated_on);
    }

    for period in model.hourly_data().unwrap_or_default() {
        println!(
            "{} - {}  {:>4}°{}  {:>4}  {:<12} {:<28}{}",
            display_time(&period.start_time),
            display_time(&period.end_time),
            period.temp,
            period.temp_unit,
            period.precep_prob,
            icon_for(period),
            period
                .forecast_type
                .map(|c| c.as_str())
                .unwrap_or("-"),
            if period.include_in_main_view { "  *" } else { "" },
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_weather::FetchError;

    struct StatusStore(u16);

    impl ForecastStore for StatusStore {
        async fn fetch_hourly_data(&self) -> Result<String, FetchError> {
            Err(FetchError::Status {
                status: self.0,
                message: "Service Unavailable".into(),
            })
        }
    }

    struct EmptyStore;

    impl ForecastStore for EmptyStore {
        async fn fetch_hourly_data(&self) -> Result<String, FetchError> {
            Ok(r#"{"generatedAt": "2024-01-07T08:00:00Z", "periods": []}"#.to_string())
        }
    }

    #[tokio::test]
    async fn failed_refresh_is_reported_as_error() {
        let mut model = ForecastModel::new(Arc::new(StatusStore(503)), None);
        model.refresh().await;

        let err = report(&model).unwrap_err();
        assert!(err.to_string().contains("Forecast refresh failed"));
    }

    #[tokio::test]
    async fn successful_refresh_reports_ok() {
        let mut model = ForecastModel::new(Arc::new(EmptyStore), None);
        model.refresh().await;

        assert!(report(&model).is_ok());
    }

    #[test]
    fn display_time_pads_clock() {
        assert_eq!(display_time("3:00 AM"), " 3:00 AM");
        assert_eq!(display_time("soon"), "soon");
    }
}
