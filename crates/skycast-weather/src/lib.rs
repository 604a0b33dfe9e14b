//! Hourly forecast parsing for SkyCast
//!
//! Turns a weather.gov style hourly forecast payload into the handful of
//! display-ready periods the widget shows, and fetches that payload over HTTP.

pub mod parser;
pub mod store;
pub mod types;

pub use parser::{parse, parse_str, split_time, SplitTime, MAX_PERIODS};
pub use store::{load_forecast, ForecastStore, NwsForecastStore};
pub use types::*;
