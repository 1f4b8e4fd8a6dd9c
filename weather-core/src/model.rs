use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    time::format_time_of_day,
    units::{TempUnit, to_display_unit},
};

/// Number of forecast days following the current day.
pub const FORECAST_DAYS: usize = 7;

/// Sanity bound for any stored Celsius value.
pub const CELSIUS_RANGE: std::ops::RangeInclusive<f64> = -100.0..=100.0;

pub fn valid_celsius(temp: f64) -> bool {
    CELSIUS_RANGE.contains(&temp)
}

/// A place to retrieve weather for.
///
/// Coordinates, postal code and country are supplied by an upstream address
/// lookup; any of them may be missing, which the retriever reports without
/// doing any I/O.
///
/// The derived field rules cover presence, ranges and the country table;
/// [`PlaceRequest::validate_with`] adds the postal code format check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlaceRequest {
    #[validate(
        required(message = "can't be blank"),
        range(min = -90.0, max = 90.0, message = "must be between -90 and 90")
    )]
    pub latitude: Option<f64>,
    #[validate(
        required(message = "can't be blank"),
        range(min = -180.0, max = 180.0, message = "must be between -180 and 180")
    )]
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(
        required(message = "can't be blank"),
        custom(function = "crate::place::not_blank")
    )]
    pub postal_code: Option<String>,
    /// ISO 3166-1 alpha-2.
    #[validate(
        required(message = "can't be blank"),
        custom(function = "crate::place::iso_country")
    )]
    pub country_code: Option<String>,
    #[serde(default)]
    pub temp_unit: TempUnit,
}

impl PlaceRequest {
    pub fn new(
        latitude: f64,
        longitude: f64,
        postal_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            postal_code: Some(postal_code.into()),
            country_code: Some(country_code.into()),
            ..Self::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_temp_unit(mut self, unit: TempUnit) -> Self {
        self.temp_unit = unit;
        self
    }
}

/// Low/high for one calendar day, stored in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    pub date: DateTime<Utc>,
    pub low_celsius: f64,
    pub high_celsius: f64,
}

impl WeatherDay {
    pub fn low(&self, unit: TempUnit) -> i64 {
        to_display_unit(self.low_celsius, unit)
    }

    pub fn high(&self, unit: TempUnit) -> i64 {
        to_display_unit(self.high_celsius, unit)
    }

    /// Short label such as "Sat 02", in UTC.
    pub fn label(&self) -> String {
        self.date.format("%a %d").to_string()
    }

    pub fn label_in(&self, tz: &Tz) -> String {
        self.date.with_timezone(tz).format("%a %d").to_string()
    }

    pub fn is_valid(&self) -> bool {
        valid_celsius(self.low_celsius) && valid_celsius(self.high_celsius)
    }
}

/// One fetched-and-normalized weather result for a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current_temp_celsius: f64,
    pub downloaded_at: DateTime<Utc>,
    pub current_day: WeatherDay,
    pub forecast_days: Vec<WeatherDay>,
    #[serde(skip)]
    pub retrieved_from_cache: bool,
}

impl WeatherSnapshot {
    pub fn current_temp(&self, unit: TempUnit) -> i64 {
        to_display_unit(self.current_temp_celsius, unit)
    }

    /// Download time as "9:00am PDT".
    pub fn downloaded_at_local(&self, tz: &Tz) -> String {
        format_time_of_day(self.downloaded_at, tz)
    }

    /// `0` is today, `1..=7` are the forecast days.
    pub fn day(&self, index: usize) -> Option<&WeatherDay> {
        match index {
            0 => Some(&self.current_day),
            n => self.forecast_days.get(n - 1),
        }
    }

    /// `0..=6` indexes the forecast days directly.
    pub fn forecast_day(&self, index: usize) -> Option<&WeatherDay> {
        self.forecast_days.get(index)
    }

    /// Today followed by the forecast days.
    pub fn days(&self) -> impl Iterator<Item = &WeatherDay> {
        std::iter::once(&self.current_day).chain(self.forecast_days.iter())
    }

    pub fn is_valid(&self) -> bool {
        valid_celsius(self.current_temp_celsius)
            && self.current_day.is_valid()
            && self.forecast_days.len() == FORECAST_DAYS
            && self.forecast_days.iter().all(WeatherDay::is_valid)
    }
}
