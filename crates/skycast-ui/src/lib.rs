mod error_mapping;
pub mod models;
pub mod services;

pub use models::{ForecastModel, ForecastSnapshot};

// Helpers the widget templates call directly
pub use skycast_weather::{split_time, ForecastCategory, HourlyPeriod, Metadata, SplitTime};
