use serde::{Deserialize, Serialize};

/// Short-forecast categories used to pick the widget icon.
///
/// Each variant corresponds to one `shortForecast` phrase of the weather.gov API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastCategory {
    Sunny,
    MostlySunny,
    PartlySunny,
    PartlyCloudy,
    MostlyCloudy,
    Cloudy,
    Clear,
    MostlyClear,
    Fog,
    SlightChanceRainShowers,
    ChanceRainShowers,
    RainShowers,
    Rain,
    ChanceSnowShowers,
    Snow,
    Thunderstorms,
}

impl ForecastCategory {
    pub const ALL: [ForecastCategory; 16] = [
        Self::Sunny,
        Self::MostlySunny,
        Self::PartlySunny,
        Self::PartlyCloudy,
        Self::MostlyCloudy,
        Self::Cloudy,
        Self::Clear,
        Self::MostlyClear,
        Self::Fog,
        Self::SlightChanceRainShowers,
        Self::ChanceRainShowers,
        Self::RainShowers,
        Self::Rain,
        Self::ChanceSnowShowers,
        Self::Snow,
        Self::Thunderstorms,
    ];

    /// Look up a `shortForecast` value.
    ///
    /// Matches either the API phrase (`"Mostly Sunny"`) or the enumeration key
    /// (`"MOSTLY_SUNNY"`), exactly. Anything else yields `None`.
    pub fn from_short_forecast(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == value || category.key() == value)
    }

    /// The weather.gov phrase for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::MostlySunny => "Mostly Sunny",
            Self::PartlySunny => "Partly Sunny",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::MostlyCloudy => "Mostly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly Clear",
            Self::Fog => "Fog",
            Self::SlightChanceRainShowers => "Slight Chance Rain Showers",
            Self::ChanceRainShowers => "Chance Rain Showers",
            Self::RainShowers => "Rain Showers",
            Self::Rain => "Rain",
            Self::ChanceSnowShowers => "Chance Snow Showers",
            Self::Snow => "Snow",
            Self::Thunderstorms => "Thunderstorms",
        }
    }

    /// Enumeration key, as serialized
    pub fn key(&self) -> &'static str {
        match self {
            Self::Sunny => "SUNNY",
            Self::MostlySunny => "MOSTLY_SUNNY",
            Self::PartlySunny => "PARTLY_SUNNY",
            Self::PartlyCloudy => "PARTLY_CLOUDY",
            Self::MostlyCloudy => "MOSTLY_CLOUDY",
            Self::Cloudy => "CLOUDY",
            Self::Clear => "CLEAR",
            Self::MostlyClear => "MOSTLY_CLEAR",
            Self::Fog => "FOG",
            Self::SlightChanceRainShowers => "SLIGHT_CHANCE_RAIN_SHOWERS",
            Self::ChanceRainShowers => "CHANCE_RAIN_SHOWERS",
            Self::RainShowers => "RAIN_SHOWERS",
            Self::Rain => "RAIN",
            Self::ChanceSnowShowers => "CHANCE_SNOW_SHOWERS",
            Self::Snow => "SNOW",
            Self::Thunderstorms => "THUNDERSTORMS",
        }
    }

    /// Get icon name (glyphs are resolved by the UI)
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Sunny | Self::MostlySunny => "sun",
            Self::Clear | Self::MostlyClear => "moon",
            Self::PartlySunny | Self::PartlyCloudy => "cloud_sun",
            Self::MostlyCloudy | Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::SlightChanceRainShowers
            | Self::ChanceRainShowers
            | Self::RainShowers
            | Self::Rain => "cloud_rain",
            Self::ChanceSnowShowers | Self::Snow => "cloud_snow",
            Self::Thunderstorms => "cloud_lightning",
        }
    }
}

impl std::fmt::Display for ForecastCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast metadata shown in the widget header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Always empty; the widget has no place name yet.
    pub location: String,
    /// `generatedAt` of the payload, copied verbatim
    pub generated_on: String,
}

/// One display-ready forecast period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPeriod {
    /// Start of the period, formatted "h:mm AM"
    pub start_time: String,
    /// End of the period, formatted "h:mm AM"
    pub end_time: String,
    pub temp: f64,
    pub temp_unit: String,
    pub is_day_time: bool,
    /// Precipitation probability with a trailing `%`
    pub precep_prob: String,
    pub forecast_type: Option<ForecastCategory>,
    /// True when the period starts after the reference time
    pub include_in_main_view: bool,
}

impl HourlyPeriod {
    pub fn is_sunny(&self) -> bool {
        self.forecast_type == Some(ForecastCategory::MostlySunny)
    }

    pub fn is_partly_sunny(&self) -> bool {
        self.forecast_type == Some(ForecastCategory::PartlySunny)
    }

    pub fn is_somewhat_cloudy(&self) -> bool {
        self.forecast_type == Some(ForecastCategory::MostlyCloudy)
    }
}

/// Result of parsing one forecast payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedForecast {
    pub metadata: Metadata,
    pub periods: Vec<HourlyPeriod>,
}

/// Raw period as delivered by the forecast API.
///
/// Only the fields the widget needs are listed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPeriod {
    pub start_time: String,
    pub end_time: String,
    pub temperature: f64,
    pub temperature_unit: String,
    // weather.gov spells it `isDaytime`; when both are sent `isDayTime` wins
    #[serde(default)]
    pub is_day_time: Option<bool>,
    #[serde(default, rename = "isDaytime")]
    pub is_daytime: Option<bool>,
    pub probability_of_precipitation: Option<RawQuantity>,
    #[serde(default)]
    pub short_forecast: Option<String>,
}

/// weather.gov quantitative value (`{"unitCode": "...", "value": 20}`)
#[derive(Debug, Deserialize)]
pub(crate) struct RawQuantity {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Errors raised by the forecast store
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

/// Forecast loading errors
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl ForecastError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }
}
