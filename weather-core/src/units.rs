//! Temperature conversions.
//!
//! Stored values are always Celsius with one decimal of precision; rounding to
//! whole degrees happens only when a value is displayed.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

pub const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

/// Display unit chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TempUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TempUnit::Fahrenheit => "fahrenheit",
            TempUnit::Celsius => "celsius",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TempUnit::Fahrenheit => "°F",
            TempUnit::Celsius => "°C",
        }
    }
}

impl fmt::Display for TempUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TempUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "fahrenheit" => Ok(TempUnit::Fahrenheit),
            "celsius" => Ok(TempUnit::Celsius),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Must be 'fahrenheit' or 'celsius'."
            )),
        }
    }
}

/// Round to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    round_tenth(kelvin - ZERO_CELSIUS_IN_KELVIN)
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + ZERO_CELSIUS_IN_KELVIN
}

/// Unrounded; callers round for display.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert a stored Celsius value to whole degrees in `unit`.
pub fn to_display_unit(celsius: f64, unit: TempUnit) -> i64 {
    let value = match unit {
        TempUnit::Celsius => celsius,
        TempUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
    };
    value.round() as i64
}

/// Like [`to_display_unit`], but an absent input stays absent.
pub fn display_temp(celsius: Option<f64>, unit: TempUnit) -> Option<i64> {
    celsius.map(|c| to_display_unit(c, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_to_celsius_rounds_to_one_decimal() {
        assert_eq!(kelvin_to_celsius(303.82), 30.7);
        assert_eq!(kelvin_to_celsius(294.61), 21.5);
        assert_eq!(kelvin_to_celsius(273.15), 0.0);
    }

    #[test]
    fn celsius_to_kelvin_reaches_absolute_zero() {
        assert_eq!(celsius_to_kelvin(-273.15), 0.0);
    }

    #[test]
    fn display_in_fahrenheit_rounds_to_nearest_degree() {
        assert_eq!(to_display_unit(30.7, TempUnit::Fahrenheit), 87);
        assert_eq!(to_display_unit(21.5, TempUnit::Fahrenheit), 71);
        assert_eq!(to_display_unit(-40.0, TempUnit::Fahrenheit), -40);
    }

    #[test]
    fn display_in_celsius_is_identity_then_round() {
        assert_eq!(to_display_unit(30.7, TempUnit::Celsius), 31);
        assert_eq!(to_display_unit(21.5, TempUnit::Celsius), 22);
        assert_eq!(to_display_unit(-0.4, TempUnit::Celsius), 0);
    }

    #[test]
    fn display_is_deterministic() {
        let first = to_display_unit(30.7, TempUnit::Fahrenheit);
        for _ in 0..10 {
            assert_eq!(to_display_unit(30.7, TempUnit::Fahrenheit), first);
        }
    }

    #[test]
    fn absent_input_stays_absent() {
        assert_eq!(display_temp(None, TempUnit::Celsius), None);
        assert_eq!(display_temp(Some(30.7), TempUnit::Celsius), Some(31));
    }

    #[test]
    fn temp_unit_parsing() {
        assert_eq!(TempUnit::try_from("Celsius").unwrap(), TempUnit::Celsius);
        assert_eq!(TempUnit::try_from("fahrenheit").unwrap(), TempUnit::Fahrenheit);
        let err = TempUnit::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown temperature unit"));
        assert_eq!(TempUnit::default(), TempUnit::Fahrenheit);
    }
}
