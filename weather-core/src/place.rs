use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::{model::PlaceRequest, place::countries::is_iso_country};

pub mod countries;
pub mod postal;

pub use postal::{PostalCodeFormat, PostalCodeShapes};

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("blank", "can't be blank"));
    }
    Ok(())
}

pub(crate) fn iso_country(code: &str) -> Result<(), ValidationError> {
    not_blank(code)?;
    if !is_iso_country(code.trim()) {
        return Err(field_error("country", "is invalid"));
    }
    Ok(())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl PlaceRequest {
    /// Run the field rules, then check the postal code against the country,
    /// collecting every failure.
    pub fn validate_with(
        &self,
        postal_codes: &dyn PostalCodeFormat,
    ) -> Result<(), ValidationErrors> {
        let mut errors = Validate::validate(self).err().unwrap_or_default();
        let failed =
            |errors: &ValidationErrors, field: &str| errors.field_errors().contains_key(field);

        // Range rules let NaN through.
        for (field, value) in [("latitude", self.latitude), ("longitude", self.longitude)] {
            if value.is_some_and(f64::is_nan) && !failed(&errors, field) {
                errors.add(field, field_error("range", "is not a number"));
            }
        }

        // Format is only checked against a known country.
        let country = present(&self.country_code).filter(|_| !failed(&errors, "country_code"));
        match (country, present(&self.postal_code)) {
            (Some(country), Some(code)) if !postal_codes.is_valid(country, code) => errors.add(
                "postal_code",
                field_error("postal_code", "is invalid for selected country"),
            ),
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Messages recorded for `field`, falling back to the error code.
pub fn messages_on(errors: &ValidationErrors, field: &str) -> Vec<String> {
    errors
        .field_errors()
        .get(field)
        .map(|errs| errs.iter().map(describe).collect())
        .unwrap_or_default()
}

/// One `"<field> <message>"` line per error, ordered by field name.
pub fn field_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| errs.iter().map(move |e| format!("{field} {}", describe(e))))
        .collect();
    lines.sort();
    lines
}

fn describe(error: &ValidationError) -> String {
    error.message.as_ref().map_or_else(|| error.code.to_string(), ToString::to_string)
}
