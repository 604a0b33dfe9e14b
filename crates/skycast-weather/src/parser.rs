//! Forecast payload parsing: raw JSON to display-ready periods.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::{
    ForecastCategory, ForecastError, HourlyPeriod, Metadata, ParsedForecast, RawPeriod,
};

/// Number of periods the widget displays
pub const MAX_PERIODS: usize = 5;

const DISPLAY_TIME_FORMAT: &str = "%-I:%M %p";

#[allow(clippy::expect_used)]
static DISPLAY_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}:\d+)\s(AM|PM)").expect("display time pattern"));

/// A display time split into clock and meridiem, or the input when it does not look like one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitTime<'a> {
    Parts { clock: &'a str, meridiem: &'a str },
    Unmatched(&'a str),
}

/// Split `"2:30 PM"` into `"2:30"` and `"PM"`.
pub fn split_time(display: &str) -> SplitTime<'_> {
    DISPLAY_TIME
        .captures(display)
        .and_then(|caps| {
            let clock = caps.get(1)?.as_str();
            let meridiem = caps.get(2)?.as_str();
            Some(SplitTime::Parts { clock, meridiem })
        })
        .unwrap_or(SplitTime::Unmatched(display))
}

/// Decode a payload string and parse it.
pub fn parse_str(payload: &str, current_time: DateTime<Utc>) -> Result<ParsedForecast, ForecastError> {
    let json: Value = serde_json::from_str(payload)
        .map_err(|e| ForecastError::malformed(format!("invalid JSON: {}", e)))?;
    parse(&json, current_time)
}

/// Parse a forecast payload into metadata and at most [`MAX_PERIODS`] periods.
///
/// A period is included in the main view when it starts strictly after
/// `current_time`. Periods past the fifth are never inspected.
pub fn parse(payload: &Value, current_time: DateTime<Utc>) -> Result<ParsedForecast, ForecastError> {
    let root = forecast_root(payload)?;

    let generated_on = root
        .get("generatedAt")
        .and_then(Value::as_str)
        .ok_or_else(|| ForecastError::malformed("generatedAt is missing or not a string"))?;

    let metadata = Metadata {
        location: String::new(),
        generated_on: generated_on.to_string(),
    };

    let periods = root
        .get("periods")
        .ok_or_else(|| ForecastError::malformed("periods is missing"))?
        .as_array()
        .ok_or_else(|| ForecastError::malformed("periods is not an array"))?;

    let periods = periods
        .iter()
        .take(MAX_PERIODS)
        .enumerate()
        .map(|(idx, period)| parse_period(idx, period, current_time))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("Parsed {} forecast periods", periods.len());

    Ok(ParsedForecast { metadata, periods })
}

/// weather.gov wraps the forecast in a GeoJSON feature; accept both shapes.
fn forecast_root(payload: &Value) -> Result<&Map<String, Value>, ForecastError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ForecastError::malformed("payload is not a JSON object"))?;

    if object.contains_key("periods") {
        return Ok(object);
    }

    match object.get("properties").and_then(Value::as_object) {
        Some(properties) if properties.contains_key("periods") => Ok(properties),
        _ => Ok(object),
    }
}

fn parse_period(
    idx: usize,
    period: &Value,
    current_time: DateTime<Utc>,
) -> Result<HourlyPeriod, ForecastError> {
    if !period.is_object() {
        return Err(ForecastError::malformed(format!(
            "periods[{}] is not an object",
            idx
        )));
    }

    let raw = RawPeriod::deserialize(period)
        .map_err(|e| ForecastError::malformed(format!("periods[{}]: {}", idx, e)))?;

    let start = parse_instant(idx, "startTime", &raw.start_time)?;
    let end = parse_instant(idx, "endTime", &raw.end_time)?;

    let short_forecast = raw.short_forecast.as_deref().unwrap_or_default();
    tracing::debug!("Period {} forecast: {:?}", idx, short_forecast);

    let forecast_type = ForecastCategory::from_short_forecast(short_forecast);
    if forecast_type.is_none() {
        tracing::warn!("Unrecognized short forecast {:?} in period {}", short_forecast, idx);
    }

    let is_day_time = raw.is_day_time.or(raw.is_daytime).ok_or_else(|| {
        ForecastError::malformed(format!("periods[{}].isDayTime is missing", idx))
    })?;
    let precep_prob = precipitation_percent(idx, &raw)?;

    Ok(HourlyPeriod {
        start_time: start.format(DISPLAY_TIME_FORMAT).to_string(),
        end_time: end.format(DISPLAY_TIME_FORMAT).to_string(),
        temp: raw.temperature,
        temp_unit: raw.temperature_unit,
        is_day_time,
        precep_prob,
        forecast_type,
        include_in_main_view: start.with_timezone(&Utc) > current_time,
    })
}

fn parse_instant(idx: usize, field: &str, raw: &str) -> Result<DateTime<FixedOffset>, ForecastError> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| {
        ForecastError::malformed(format!("periods[{}].{} {:?}: {}", idx, field, raw, e))
    })
}

fn precipitation_percent(idx: usize, raw: &RawPeriod) -> Result<String, ForecastError> {
    let quantity = raw.probability_of_precipitation.as_ref().ok_or_else(|| {
        ForecastError::malformed(format!("periods[{}].probabilityOfPrecipitation is missing", idx))
    })?;

    let value = match &quantity.value {
        Some(Value::Number(n)) => n.as_f64().map(|v| v.to_string()),
        Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => Some(s.trim().to_string()),
        _ => None,
    };

    value.map(|v| format!("{}%", v)).ok_or_else(|| {
        ForecastError::malformed(format!(
            "periods[{}].probabilityOfPrecipitation.value is missing or not numeric",
            idx
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_period(start: &str, end: &str, short_forecast: &str) -> Value {
        json!({
            "number": 1,
            "startTime": start,
            "endTime": end,
            "isDaytime": false,
            "temperature": 34,
            "temperatureUnit": "F",
            "probabilityOfPrecipitation": { "unitCode": "wmoUnit:percent", "value": 20 },
            "shortForecast": short_forecast
        })
    }

    /// Seven hourly periods starting at 2024-01-07T01:00-05:00
    fn seven_periods() -> Value {
        let periods: Vec<Value> = (1..=7)
            .map(|hour| {
                raw_period(
                    &format!("2024-01-07T{:02}:00:00-05:00", hour),
                    &format!("2024-01-07T{:02}:00:00-05:00", hour + 1),
                    "Mostly Cloudy",
                )
            })
            .collect();
        json!({ "generatedAt": "2024-01-07T08:00:00Z", "periods": periods })
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_split_time_parts() {
        assert_eq!(
            split_time("2:30 PM"),
            SplitTime::Parts { clock: "2:30", meridiem: "PM" }
        );
    }

    #[test]
    fn test_split_time_two_digit_hour() {
        assert_eq!(
            split_time("12:00 AM"),
            SplitTime::Parts { clock: "12:00", meridiem: "AM" }
        );
    }

    #[test]
    fn test_split_time_inside_longer_string() {
        assert_eq!(
            split_time("1/7/2024, 3:00 AM"),
            SplitTime::Parts { clock: "3:00", meridiem: "AM" }
        );
    }

    #[test]
    fn test_split_time_unmatched_returns_input() {
        assert_eq!(split_time("garbage"), SplitTime::Unmatched("garbage"));
        assert_eq!(split_time("14:00"), SplitTime::Unmatched("14:00"));
        assert_eq!(split_time(""), SplitTime::Unmatched(""));
    }

    #[test]
    fn test_end_to_end_seven_periods() {
        // Between period[2] (03:00) and period[3] (04:00)
        let now = at("2024-01-07T03:30:00-05:00");
        let parsed = parse(&seven_periods(), now).unwrap();

        assert_eq!(parsed.periods.len(), 5);
        let main_view: Vec<bool> = parsed.periods.iter().map(|p| p.include_in_main_view).collect();
        assert_eq!(main_view, vec![false, false, false, true, true]);
        assert_eq!(parsed.periods[0].start_time, "1:00 AM");
        assert_eq!(parsed.periods[4].start_time, "5:00 AM");
        assert_eq!(parsed.periods[4].end_time, "6:00 AM");
    }

    #[test]
    fn test_start_equal_to_reference_is_not_upcoming() {
        let now = at("2024-01-07T02:00:00-05:00");
        let parsed = parse(&seven_periods(), now).unwrap();
        assert!(!parsed.periods[1].include_in_main_view);
        assert!(parsed.periods[2].include_in_main_view);
    }

    #[test]
    fn test_comparison_uses_instants_not_strings() {
        // 06:30Z is 01:30-05:00, so only the 01:00 period has started
        let now = at("2024-01-07T06:30:00Z");
        let parsed = parse(&seven_periods(), now).unwrap();
        assert!(!parsed.periods[0].include_in_main_view);
        assert!(parsed.periods[1].include_in_main_view);
    }

    #[test]
    fn test_fewer_than_five_periods() {
        let payload = json!({
            "generatedAt": "2024-01-07T08:00:00Z",
            "periods": [
                raw_period("2024-01-07T01:00:00-05:00", "2024-01-07T02:00:00-05:00", "Clear"),
                raw_period("2024-01-07T02:00:00-05:00", "2024-01-07T03:00:00-05:00", "Fog"),
            ]
        });
        let parsed = parse(&payload, at("2024-01-07T00:00:00-05:00")).unwrap();
        assert_eq!(parsed.periods.len(), 2);
        assert_eq!(parsed.periods[0].forecast_type, Some(ForecastCategory::Clear));
        assert_eq!(parsed.periods[1].forecast_type, Some(ForecastCategory::Fog));
    }

    #[test]
    fn test_empty_periods() {
        let payload = json!({ "generatedAt": "2024-01-07T08:00:00Z", "periods": [] });
        let parsed = parse(&payload, Utc::now()).unwrap();
        assert!(parsed.periods.is_empty());
    }

    #[test]
    fn test_metadata_copied_verbatim() {
        let parsed = parse(&seven_periods(), Utc::now()).unwrap();
        assert_eq!(parsed.metadata.generated_on, "2024-01-07T08:00:00Z");
        assert_eq!(parsed.metadata.location, "");
    }

    #[test]
    fn test_fields_copied() {
        let parsed = parse(&seven_periods(), Utc::now()).unwrap();
        let first = &parsed.periods[0];
        assert_eq!(first.temp, 34.0);
        assert_eq!(first.temp_unit, "F");
        assert!(!first.is_day_time);
        assert_eq!(first.precep_prob, "20%");
        assert!(first.is_somewhat_cloudy());
    }

    #[test]
    fn test_is_day_time_spelling_accepted() {
        let mut period = raw_period("2024-01-07T13:00:00-05:00", "2024-01-07T14:00:00-05:00", "Sunny");
        let obj = period.as_object_mut().unwrap();
        obj.remove("isDaytime");
        obj.insert("isDayTime".into(), json!(true));

        let payload = json!({ "generatedAt": "x", "periods": [period] });
        let parsed = parse(&payload, Utc::now()).unwrap();
        assert!(parsed.periods[0].is_day_time);
        assert_eq!(parsed.periods[0].start_time, "1:00 PM");
    }

    #[test]
    fn test_both_day_time_spellings_prefer_is_day_time() {
        let mut period = raw_period("2024-01-07T13:00:00-05:00", "2024-01-07T14:00:00-05:00", "Sunny");
        period["isDayTime"] = json!(true);

        let payload = json!({ "generatedAt": "x", "periods": [period] });
        let parsed = parse(&payload, Utc::now()).unwrap();
        assert!(parsed.periods[0].is_day_time);
    }

    #[test]
    fn test_missing_day_time_is_malformed() {
        let mut period = raw_period("2024-01-07T13:00:00-05:00", "2024-01-07T14:00:00-05:00", "Sunny");
        period.as_object_mut().unwrap().remove("isDaytime");

        let payload = json!({ "generatedAt": "x", "periods": [period] });
        let err = parse(&payload, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("periods[0].isDayTime is missing"));
    }

    #[test]
    fn test_unrecognized_short_forecast_is_not_an_error() {
        let payload = json!({
            "generatedAt": "2024-01-07T08:00:00Z",
            "periods": [raw_period(
                "2024-01-07T01:00:00-05:00",
                "2024-01-07T02:00:00-05:00",
                "Patchy Blowing Dust"
            )]
        });
        let parsed = parse(&payload, Utc::now()).unwrap();
        let period = &parsed.periods[0];
        assert_eq!(period.forecast_type, None);
        assert!(!period.is_sunny());
        assert!(!period.is_partly_sunny());
        assert!(!period.is_somewhat_cloudy());
    }

    #[test]
    fn test_missing_short_forecast_is_not_an_error() {
        let mut period = raw_period("2024-01-07T01:00:00-05:00", "2024-01-07T02:00:00-05:00", "");
        period.as_object_mut().unwrap().remove("shortForecast");
        let payload = json!({ "generatedAt": "x", "periods": [period] });

        let parsed = parse(&payload, Utc::now()).unwrap();
        assert_eq!(parsed.periods[0].forecast_type, None);
    }

    #[test]
    fn test_precipitation_formats() {
        let cases = [
            (json!(0), "0%"),
            (json!(45), "45%"),
            (json!(12.5), "12.5%"),
            (json!("30"), "30%"),
        ];
        for (value, expected) in cases {
            let mut period =
                raw_period("2024-01-07T01:00:00-05:00", "2024-01-07T02:00:00-05:00", "Rain");
            period["probabilityOfPrecipitation"]["value"] = value;
            let payload = json!({ "generatedAt": "x", "periods": [period] });

            let parsed = parse(&payload, Utc::now()).unwrap();
            assert_eq!(parsed.periods[0].precep_prob, expected);
            assert!(parsed.periods[0].precep_prob.ends_with('%'));
        }
    }

    #[test]
    fn test_missing_precipitation_is_malformed() {
        let mut period = raw_period("2024-01-07T01:00:00-05:00", "2024-01-07T02:00:00-05:00", "Rain");
        period.as_object_mut().unwrap().remove("probabilityOfPrecipitation");
        let payload = json!({ "generatedAt": "x", "periods": [period] });

        let err = parse(&payload, Utc::now()).unwrap_err();
        assert!(matches!(err, ForecastError::MalformedPayload(ref m) if m.contains("probabilityOfPrecipitation")));
    }

    #[test]
    fn test_null_precipitation_value_is_malformed() {
        let mut period = raw_period("2024-01-07T01:00:00-05:00", "2024-01-07T02:00:00-05:00", "Rain");
        period["probabilityOfPrecipitation"]["value"] = Value::Null;
        let payload = json!({ "generatedAt": "x", "periods": [period] });

        assert!(matches!(
            parse(&payload, Utc::now()),
            Err(ForecastError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_missing_periods_is_malformed() {
        let payload = json!({ "generatedAt": "2024-01-07T08:00:00Z" });
        let err = parse(&payload, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("periods is missing"));
    }

    #[test]
    fn test_periods_not_array_is_malformed() {
        let payload = json!({ "generatedAt": "x", "periods": "soon" });
        let err = parse(&payload, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn test_unparsable_start_time_is_malformed() {
        let payload = json!({
            "generatedAt": "x",
            "periods": [raw_period("tomorrow", "2024-01-07T02:00:00-05:00", "Rain")]
        });
        let err = parse(&payload, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("periods[0].startTime"));
    }

    #[test]
    fn test_bad_period_after_fifth_is_ignored() {
        let mut payload = seven_periods();
        payload["periods"][6] = json!("not a period");
        let parsed = parse(&payload, Utc::now()).unwrap();
        assert_eq!(parsed.periods.len(), 5);
    }

    #[test]
    fn test_geojson_properties_wrapper() {
        let payload = json!({
            "type": "Feature",
            "properties": seven_periods()
        });
        let parsed = parse(&payload, Utc::now()).unwrap();
        assert_eq!(parsed.periods.len(), 5);
        assert_eq!(parsed.metadata.generated_on, "2024-01-07T08:00:00Z");
    }

    #[test]
    fn test_parse_str_rejects_invalid_json() {
        let err = parse_str("{not json", Utc::now()).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_parse_str() {
        let body = seven_periods().to_string();
        let parsed = parse_str(&body, at("2024-01-07T00:00:00-05:00")).unwrap();
        assert!(parsed.periods.iter().all(|p| p.include_in_main_view));
    }
}
