//! Field validators.
//!
//! Each predicate is pure and total. [`validate_checklist`] runs them in form
//! order and reports the first failing field; the repository itself never
//! calls it, the collaborator submitting the form does.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::checklist::VehicleChecklist;
use crate::error::{Error, Result};

/// Mercosul plate: `ABC1D23`.
static MERCOSUL_PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9][A-Z][0-9]{2}$").expect("valid regex"));

/// Four letters and three digits: `ABCD123`.
static FOUR_LETTER_PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{4}[0-9]{3}$").expect("valid regex"));

/// Machinery plate: `PMM00XX`.
static MACHINERY_PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]{2}[A-Z]{2}$").expect("valid regex"));

static KM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").expect("valid regex"));

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid regex"));

/// Strip everything but ASCII letters and digits, then upper-case.
#[must_use]
pub fn normalize_plate(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Check a licence plate against the accepted shapes.
#[must_use]
pub fn validate_plate(value: &str) -> bool {
    let plate = normalize_plate(value);
    MERCOSUL_PLATE.is_match(&plate)
        || FOUR_LETTER_PLATE.is_match(&plate)
        || MACHINERY_PLATE.is_match(&plate)
}

/// Check a free-text name: non-blank and free of digits.
#[must_use]
pub fn validate_text(value: &str) -> bool {
    !value.trim().is_empty() && !value.chars().any(|c| c.is_ascii_digit())
}

/// Check an odometer reading: a positive integer or decimal, with either a
/// comma or a dot as decimal separator.
#[must_use]
pub fn validate_km(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .replacen(',', ".", 1);

    if !KM.is_match(&cleaned) {
        return false;
    }
    cleaned.parse::<f64>().is_ok_and(|km| km > 0.0)
}

/// Check a `YYYY-MM-DD` date that exists on the calendar.
#[must_use]
pub fn validate_date(value: &str) -> bool {
    let value = value.trim();
    DATE.is_match(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Check a 24-hour `HH:MM` time.
#[must_use]
pub fn validate_time(value: &str) -> bool {
    TIME.is_match(value.trim())
}

/// Run every field rule a checklist must pass before it is saved.
///
/// Checks plate, driver, km, date, and time in that order.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first field that fails.
pub fn validate_checklist(checklist: &VehicleChecklist) -> Result<()> {
    if !validate_plate(&checklist.plate) {
        return Err(Error::validation(
            "plate",
            "use a Mercosul (ABC1D23), four-letter (ABCD123) or machinery (ABC12DE) plate",
        ));
    }
    if !validate_text(&checklist.driver) {
        return Err(Error::validation(
            "driver",
            "name must be filled in and contain no digits",
        ));
    }
    if !validate_km(&checklist.km) {
        return Err(Error::validation("km", "must be a number greater than zero"));
    }
    if !validate_date(&checklist.date) {
        return Err(Error::validation("date", "use a real date as YYYY-MM-DD"));
    }
    if !validate_time(&checklist.time) {
        return Err(Error::validation("time", "use HH:MM (24h)"));
    }
    Ok(())
}
