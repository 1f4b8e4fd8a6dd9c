//! Decide whether provider and cached payloads can be trusted.
//!
//! Both paths share one acceptance rule: every temperature must fall within
//! -100°C..=100°C (173.15K..=373.15K) and there must be a current day plus
//! exactly seven forecast days. Rejections are logged and returned as
//! [`DataError`]; callers treat them as "absent".

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    model::{FORECAST_DAYS, WeatherDay, WeatherSnapshot, valid_celsius},
    provider::OneCallResponse,
    time::parse_timestamp,
};

pub const KELVIN_RANGE: RangeInclusive<f64> = 173.15..=373.15;

/// Today plus the forecast days.
pub const PROVIDER_DAYS: usize = FORECAST_DAYS + 1;

/// Provider day timestamps further ahead than this are rejected.
const MAX_DAY_LOOKAHEAD_DAYS: i64 = 9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("payload is not a valid JSON object: {0}")]
    Malformed(String),

    #[error("missing field `{0}`")]
    Missing(String),

    #[error("temperature out of range at `{field}`: {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("expected {expected} days, found {found}")]
    DayCount { expected: usize, found: usize },

    #[error("invalid timestamp at `{field}`: {value}")]
    Timestamp { field: String, value: String },

    #[error("unexpected value at `{field}`: {value}")]
    WrongType { field: String, value: String },
}

/// A provider day that passed validation, still in Kelvin.
#[derive(Debug, Clone, PartialEq)]
pub struct KelvinDay {
    pub date: DateTime<Utc>,
    pub min: f64,
    pub max: f64,
}

/// A provider payload that passed validation, still in Kelvin.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidForecast {
    pub current_temp: f64,
    pub today: KelvinDay,
    /// Exactly [`FORECAST_DAYS`] entries.
    pub forecast: Vec<KelvinDay>,
}

fn check_kelvin(field: String, temp: &Value) -> Result<f64, DataError> {
    let temp = match temp {
        Value::Null => return Err(DataError::Missing(field)),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .ok_or_else(|| DataError::WrongType {
        field: field.clone(),
        value: temp.to_string(),
    })?;

    if KELVIN_RANGE.contains(&temp) {
        Ok(temp)
    } else {
        Err(DataError::OutOfRange { field, value: temp })
    }
}

fn check_celsius(field: String, temp: Option<f64>) -> Result<f64, DataError> {
    let temp = temp.ok_or_else(|| DataError::Missing(field.clone()))?;
    if valid_celsius(temp) {
        Ok(temp)
    } else {
        Err(DataError::OutOfRange { field, value: temp })
    }
}

/// Unix seconds, integral floats included.
fn unix_seconds(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Day timestamps must fall within `[epoch, now + 9 days]`, whatever form
/// they arrive in.
fn provider_day_time(
    field: String,
    dt: &Value,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, DataError> {
    let latest = now + Duration::days(MAX_DAY_LOOKAHEAD_DAYS);
    let parsed = match dt {
        Value::Null => return Err(DataError::Missing(field)),
        Value::Number(n) => unix_seconds(n).and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    };

    match parsed {
        Some(at) if at.timestamp() >= 0 && at <= latest => Ok(at),
        _ => Err(DataError::Timestamp {
            field,
            value: dt.to_string(),
        }),
    }
}

fn check_provider_payload(
    payload: &OneCallResponse,
    now: DateTime<Utc>,
) -> Result<ValidForecast, DataError> {
    let current_temp = check_kelvin("current.temp".into(), &payload.current["temp"])?;

    let daily = match &payload.daily {
        Value::Null => return Err(DataError::Missing("daily".into())),
        Value::Array(days) => days,
        other => {
            return Err(DataError::WrongType {
                field: "daily".into(),
                value: other.to_string(),
            });
        }
    };
    if daily.len() < PROVIDER_DAYS {
        return Err(DataError::DayCount {
            expected: PROVIDER_DAYS,
            found: daily.len(),
        });
    }

    let check_day = |i: usize| -> Result<KelvinDay, DataError> {
        let day = &daily[i];
        match day {
            Value::Object(_) => {}
            Value::Null => return Err(DataError::Missing(format!("daily[{i}]"))),
            other => {
                return Err(DataError::WrongType {
                    field: format!("daily[{i}]"),
                    value: other.to_string(),
                });
            }
        }

        Ok(KelvinDay {
            date: provider_day_time(format!("daily[{i}].dt"), &day["dt"], now)?,
            min: check_kelvin(format!("daily[{i}].temp.min"), &day["temp"]["min"])?,
            max: check_kelvin(format!("daily[{i}].temp.max"), &day["temp"]["max"])?,
        })
    };

    let today = check_day(0)?;
    let forecast = (1..PROVIDER_DAYS).map(check_day).collect::<Result<Vec<_>, DataError>>()?;

    Ok(ValidForecast {
        current_temp,
        today,
        forecast,
    })
}

/// Validate a raw provider payload. Only the first eight daily entries are
/// inspected; anything after them is ignored.
pub fn validate_provider_payload(
    payload: &OneCallResponse,
    now: DateTime<Utc>,
) -> Result<ValidForecast, DataError> {
    check_provider_payload(payload, now).inspect_err(|e| {
        warn!(error = %e, "Invalid OpenWeather data");
    })
}

#[derive(Debug, Deserialize)]
struct CachedDay {
    date: Option<String>,
    low_celsius: Option<f64>,
    high_celsius: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CachedSnapshot {
    current_temp_celsius: Option<f64>,
    downloaded_at: Option<String>,
    current_day: Option<CachedDay>,
    forecast_days: Option<Vec<Option<CachedDay>>>,
}

fn cached_time(field: String, value: Option<&str>) -> Result<DateTime<Utc>, DataError> {
    let value = value.ok_or_else(|| DataError::Missing(field.clone()))?;
    parse_timestamp(value).ok_or_else(|| DataError::Timestamp {
        field,
        value: value.to_string(),
    })
}

fn cached_day(field: &str, day: Option<&CachedDay>) -> Result<WeatherDay, DataError> {
    let day = day.ok_or_else(|| DataError::Missing(field.to_string()))?;
    Ok(WeatherDay {
        date: cached_time(format!("{field}.date"), day.date.as_deref())?,
        low_celsius: check_celsius(format!("{field}.low_celsius"), day.low_celsius)?,
        high_celsius: check_celsius(format!("{field}.high_celsius"), day.high_celsius)?,
    })
}

fn check_cached_snapshot(bytes: &[u8]) -> Result<WeatherSnapshot, DataError> {
    let cached: CachedSnapshot =
        serde_json::from_slice(bytes).map_err(|e| DataError::Malformed(e.to_string()))?;

    let current_temp_celsius =
        check_celsius("current_temp_celsius".into(), cached.current_temp_celsius)?;
    let downloaded_at = cached_time("downloaded_at".into(), cached.downloaded_at.as_deref())?;
    let current_day = cached_day("current_day", cached.current_day.as_ref())?;

    let days = cached.forecast_days.ok_or_else(|| DataError::Missing("forecast_days".into()))?;
    if days.len() != FORECAST_DAYS {
        return Err(DataError::DayCount {
            expected: FORECAST_DAYS,
            found: days.len(),
        });
    }

    let forecast_days = days
        .iter()
        .enumerate()
        .map(|(i, day)| cached_day(&format!("forecast_days[{i}]"), day.as_ref()))
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(WeatherSnapshot {
        current_temp_celsius,
        downloaded_at,
        current_day,
        forecast_days,
        retrieved_from_cache: true,
    })
}

/// Parse and validate a cached entry. Rejections are left for the caller to
/// report; the raw entry is only logged at debug level.
pub fn parse_cached_snapshot(bytes: &[u8]) -> Result<WeatherSnapshot, DataError> {
    check_cached_snapshot(bytes).inspect_err(|e| {
        debug!(error = %e, data = %String::from_utf8_lossy(bytes), "Invalid cache data");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 1, 16, 0, 0).unwrap()
    }

    fn provider_body(current: f64) -> Value {
        let days: Vec<Value> = (0..8i64)
            .map(|i| {
                json!({
                    "dt": 1693681200 + i * 86_400,
                    "temp": {"min": 290.0, "max": 300.0}
                })
            })
            .collect();
        json!({"current": {"temp": current}, "daily": days})
    }

    fn payload(value: Value) -> OneCallResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_well_formed_provider_payload() {
        let valid = validate_provider_payload(&payload(provider_body(303.82)), now()).unwrap();
        assert_eq!(valid.current_temp, 303.82);
        assert_eq!(valid.forecast.len(), 7);
        assert_eq!(valid.today.date, Utc.with_ymd_and_hms(2023, 9, 2, 19, 0, 0).unwrap());
    }

    #[test]
    fn kelvin_bounds_are_inclusive() {
        for k in [173.15, 373.15] {
            assert!(validate_provider_payload(&payload(provider_body(k)), now()).is_ok());
        }
        for k in [173.14, 373.16] {
            let err = validate_provider_payload(&payload(provider_body(k)), now()).unwrap_err();
            assert!(matches!(err, DataError::OutOfRange { .. }), "{err:?}");
        }
    }

    #[test]
    fn rejects_missing_current_temp() {
        let mut body = provider_body(300.0);
        body["current"] = json!({});
        let err = validate_provider_payload(&payload(body), now()).unwrap_err();
        assert_eq!(err, DataError::Missing("current.temp".into()));
    }

    #[test]
    fn rejects_short_daily_list() {
        let mut body = provider_body(300.0);
        body["daily"].as_array_mut().unwrap().truncate(7);
        let err = validate_provider_payload(&payload(body), now()).unwrap_err();
        assert_eq!(
            err,
            DataError::DayCount {
                expected: 8,
                found: 7
            }
        );
    }

    #[test]
    fn ignores_days_beyond_the_eighth() {
        let extras = [
            json!({"dt": 1693681200.5, "temp": {"min": 290.0, "max": 300.0}}),
            json!({"dt": 1694286000, "temp": {"min": "n/a", "max": 300.0}}),
            json!("not a day"),
            json!({"dt": null}),
        ];
        for extra in extras {
            let mut body = provider_body(300.0);
            body["daily"].as_array_mut().unwrap().push(extra.clone());
            let valid = validate_provider_payload(&payload(body), now())
                .unwrap_or_else(|e| panic!("{extra}: {e}"));
            assert_eq!(valid.forecast.len(), 7);
        }
    }

    #[test]
    fn wrong_typed_values_are_data_errors() {
        let mut body = provider_body(300.0);
        body["current"]["temp"] = json!("hot");
        assert!(matches!(
            validate_provider_payload(&payload(body), now()).unwrap_err(),
            DataError::WrongType { .. }
        ));

        let mut body = provider_body(300.0);
        body["daily"][4]["temp"]["min"] = json!("n/a");
        assert_eq!(
            validate_provider_payload(&payload(body), now()).unwrap_err(),
            DataError::WrongType {
                field: "daily[4].temp.min".into(),
                value: "\"n/a\"".into(),
            }
        );

        let mut body = provider_body(300.0);
        body["daily"] = json!({"0": {}});
        assert!(matches!(
            validate_provider_payload(&payload(body), now()).unwrap_err(),
            DataError::WrongType { .. }
        ));
    }

    #[test]
    fn integral_float_timestamps_are_accepted() {
        let mut body = provider_body(300.0);
        body["daily"][0]["dt"] = json!(1693681200.0);
        let valid = validate_provider_payload(&payload(body), now()).unwrap();
        assert_eq!(valid.today.date, Utc.with_ymd_and_hms(2023, 9, 2, 19, 0, 0).unwrap());

        let mut body = provider_body(300.0);
        body["daily"][0]["dt"] = json!(1693681200.5);
        assert!(matches!(
            validate_provider_payload(&payload(body), now()).unwrap_err(),
            DataError::Timestamp { .. }
        ));
    }

    #[test]
    fn rejects_bad_day_entries() {
        let mut body = provider_body(300.0);
        body["daily"][3]["temp"]["max"] = json!(400.0);
        assert!(validate_provider_payload(&payload(body), now()).is_err());

        let mut body = provider_body(300.0);
        body["daily"][2] = Value::Null;
        assert_eq!(
            validate_provider_payload(&payload(body), now()).unwrap_err(),
            DataError::Missing("daily[2]".into())
        );

        let mut body = provider_body(300.0);
        body["daily"][5].as_object_mut().unwrap().remove("dt");
        assert!(validate_provider_payload(&payload(body), now()).is_err());
    }

    #[test]
    fn provider_day_time_window() {
        let mut body = provider_body(300.0);
        body["daily"][0]["dt"] = json!(-1);
        assert!(validate_provider_payload(&payload(body), now()).is_err());

        let mut body = provider_body(300.0);
        body["daily"][7]["dt"] = json!((now() + Duration::days(10)).timestamp());
        assert!(validate_provider_payload(&payload(body), now()).is_err());

        for text in ["1969-12-31T23:59:59Z", "2023-09-11T16:00:01Z"] {
            let mut body = provider_body(300.0);
            body["daily"][3]["dt"] = json!(text);
            let err = validate_provider_payload(&payload(body), now()).unwrap_err();
            assert!(matches!(err, DataError::Timestamp { .. }), "{text}: {err:?}");
        }

        let mut body = provider_body(300.0);
        body["daily"][3]["dt"] = json!("1970-01-01T00:00:00Z");
        assert!(validate_provider_payload(&payload(body), now()).is_ok());
    }

    #[test]
    fn accepts_text_day_timestamps() {
        let mut body = provider_body(300.0);
        body["daily"][0]["dt"] = json!("2023-09-02T19:00:00Z");
        body["daily"][1]["dt"] = json!("2023-09-03 19:00:00 UTC");
        let valid = validate_provider_payload(&payload(body), now()).unwrap();
        assert_eq!(valid.forecast[0].date, Utc.with_ymd_and_hms(2023, 9, 3, 19, 0, 0).unwrap());

        let mut body = provider_body(300.0);
        body["daily"][0]["dt"] = json!("garbage");
        assert!(validate_provider_payload(&payload(body), now()).is_err());
    }

    fn cached_body() -> Value {
        let day = |d: u32| {
            json!({
                "date": format!("2023-09-{d:02}T19:00:00Z"),
                "low_celsius": 21.5,
                "high_celsius": 31.7
            })
        };
        json!({
            "current_temp_celsius": 30.7,
            "downloaded_at": "2023-09-01T16:00:00Z",
            "current_day": day(2),
            "forecast_days": (3..=9).map(day).collect::<Vec<_>>(),
        })
    }

    fn parse(value: &Value) -> Result<WeatherSnapshot, DataError> {
        parse_cached_snapshot(value.to_string().as_bytes())
    }

    #[test]
    fn accepts_well_formed_cache_entry() {
        let snap = parse(&cached_body()).unwrap();
        assert!(snap.retrieved_from_cache);
        assert!(snap.is_valid());
        assert_eq!(snap.current_temp_celsius, 30.7);
        assert_eq!(snap.forecast_days[6].label(), "Sat 09");
    }

    #[test]
    fn rejects_non_object_cache_entries() {
        for raw in ["", "}{ invalid json", "null", "\"not a hash\"", "[]"] {
            let err = parse_cached_snapshot(raw.as_bytes()).unwrap_err();
            assert!(matches!(err, DataError::Malformed(_)), "{raw}: {err:?}");
        }
    }

    #[test]
    fn rejects_corrupted_cache_entries() {
        let base = cached_body();

        let mut last_day_removed = base.clone();
        last_day_removed["forecast_days"].as_array_mut().unwrap().pop();

        let mut last_day_null = base.clone();
        last_day_null["forecast_days"][6] = Value::Null;

        let mut missing_date = base.clone();
        missing_date["forecast_days"][6].as_object_mut().unwrap().remove("date");

        let mut invalid_temp = base.clone();
        invalid_temp["forecast_days"][6]["high_celsius"] = json!(150);

        let mut bad_downloaded_at = base.clone();
        bad_downloaded_at["downloaded_at"] = json!("2023");

        let mut no_current_temp = base.clone();
        no_current_temp.as_object_mut().unwrap().remove("current_temp_celsius");

        let mut no_current_day = base;
        no_current_day["current_day"] = Value::Null;

        for corrupted in [
            last_day_removed,
            last_day_null,
            missing_date,
            invalid_temp,
            bad_downloaded_at,
            no_current_temp,
            no_current_day,
        ] {
            assert!(parse(&corrupted).is_err(), "{corrupted}");
        }
    }

    #[test]
    fn rejects_wrong_field_types() {
        let mut body = cached_body();
        body["current_day"]["low_celsius"] = json!("cold");
        assert!(matches!(parse(&body).unwrap_err(), DataError::Malformed(_)));
    }
}
