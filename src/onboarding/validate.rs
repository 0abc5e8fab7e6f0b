//! Step validators — pure functions mapping raw fields to field errors.
//!
//! Every rule runs; all failures for a step are returned together. The
//! only clock dependency is the date-of-birth age check, which is
//! evaluated against the current date at call time (the `_at` variants
//! take an explicit date for deterministic tests).

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

use crate::error::FieldError;

use super::flow::{AddressRule, FlowConfig};
use super::model::{
    AddressInput, ExperienceTier, IncomeBand, InvestmentTimeline, NetWorthBand, PreferencesInput,
    ProfileInput, RiskTolerance, StepInput,
};
use super::sanitize::FORBIDDEN_CHARS;

/// Local part, `@`, domain containing a dot, TLD of at least 2 letters.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").unwrap());

/// E.164: `+` followed by 2–15 digits, first digit 1–9.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").unwrap());

const NAME_MAX: usize = 50;
const BIO_MAX: usize = 500;
const MIN_AGE_YEARS: i32 = 18;

/// Validate one step's raw input against the flow's field policy.
pub fn validate_step(input: &StepInput, flow: &FlowConfig) -> Vec<FieldError> {
    match input {
        StepInput::Profile(p) => validate_profile(p, flow),
        StepInput::Address(a) => validate_address(a, flow.address_rule),
        StepInput::Preferences(p) => validate_preferences(p, flow.empty_selection_allowed),
    }
}

// ── Profile step ────────────────────────────────────────────────────────

pub fn validate_profile(input: &ProfileInput, flow: &FlowConfig) -> Vec<FieldError> {
    validate_profile_at(input, flow, Utc::now().date_naive())
}

pub fn validate_profile_at(
    input: &ProfileInput,
    flow: &FlowConfig,
    today: NaiveDate,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_name(&mut errors, "first_name", input.first_name.as_deref(), true);
    check_name(&mut errors, "middle_name", input.middle_name.as_deref(), false);
    check_name(&mut errors, "last_name", input.last_name.as_deref(), true);

    match input.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => errors.push(FieldError::new("email", "Email is required")),
        Some(email) if !EMAIL_RE.is_match(email) => {
            errors.push(FieldError::new("email", "Invalid email address"));
        }
        Some(_) => {}
    }

    check_phone(&mut errors, input.phone.as_deref(), flow.phone_required);

    match input.date_of_birth.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => errors.push(FieldError::new("date_of_birth", "Date of birth is required")),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Err(_) => errors.push(FieldError::new(
                "date_of_birth",
                "Date of birth must be formatted YYYY-MM-DD",
            )),
            Ok(dob) if dob > today => {
                errors.push(FieldError::new(
                    "date_of_birth",
                    "Date of birth cannot be in the future",
                ));
            }
            Ok(dob) if age_in_years(dob, today) < MIN_AGE_YEARS => {
                errors.push(FieldError::new(
                    "date_of_birth",
                    "You must be at least 18 years old",
                ));
            }
            Ok(_) => {}
        },
    }

    if let Some(bio) = input.bio.as_deref() {
        if !bio.is_empty() {
            if bio.trim().is_empty() {
                errors.push(FieldError::new("bio", "Bio cannot be only whitespace"));
            } else if bio.trim().chars().count() > BIO_MAX {
                errors.push(FieldError::new(
                    "bio",
                    format!("Bio must be at most {BIO_MAX} characters"),
                ));
            }
        }
    }

    errors
}

/// Validate a phone number on its own.
pub fn validate_phone(phone: Option<&str>, required: bool) -> Option<FieldError> {
    let mut errors = Vec::new();
    check_phone(&mut errors, phone, required);
    errors.into_iter().next()
}

fn check_phone(errors: &mut Vec<FieldError>, phone: Option<&str>, required: bool) {
    match phone.map(str::trim).filter(|s| !s.is_empty()) {
        None if required => errors.push(FieldError::new("phone", "Phone number is required")),
        None => {}
        Some(phone) if !PHONE_RE.is_match(phone) => {
            errors.push(FieldError::new(
                "phone",
                "Phone number must be in international format, e.g. +14155550123",
            ));
        }
        Some(_) => {}
    }
}

/// Full calendar years between `dob` and `today` (year/month/day
/// comparison, no rounding).
fn age_in_years(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

fn check_name(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>, required: bool) {
    let trimmed = value.map(str::trim).filter(|s| !s.is_empty());
    match trimmed {
        None if required => errors.push(FieldError::new(field, "This field is required")),
        None => {}
        Some(name) => {
            if name.chars().count() > NAME_MAX {
                errors.push(FieldError::new(
                    field,
                    format!("Must be at most {NAME_MAX} characters"),
                ));
            }
            if name.contains(FORBIDDEN_CHARS) {
                errors.push(FieldError::new(field, "Contains invalid characters"));
            }
        }
    }
}

// ── Address step ────────────────────────────────────────────────────────

pub fn validate_address(input: &AddressInput, rule: AddressRule) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let min = |strict: usize| match rule {
        AddressRule::MinLengths => strict,
        AddressRule::NonEmptyOnly => 1,
    };

    check_min_len(&mut errors, "street", input.street.as_deref(), min(5));
    check_min_len(&mut errors, "city", input.city.as_deref(), min(2));
    check_min_len(&mut errors, "state", input.state.as_deref(), min(2));
    check_min_len(&mut errors, "postal_code", input.postal_code.as_deref(), min(3));
    check_min_len(&mut errors, "country", input.country.as_deref(), min(2));

    errors
}

fn check_min_len(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>, min: usize) {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => errors.push(FieldError::new(field, "This field is required")),
        Some(v) if v.chars().count() < min => {
            errors.push(FieldError::new(
                field,
                format!("Must be at least {min} characters"),
            ));
        }
        Some(_) => {}
    }
}

// ── Preferences step ────────────────────────────────────────────────────

pub fn validate_preferences(input: &PreferencesInput, empty_selection_allowed: bool) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_enum::<ExperienceTier>(&mut errors, "experience", input.experience.as_deref(), true);
    check_enum::<RiskTolerance>(
        &mut errors,
        "risk_tolerance",
        input.risk_tolerance.as_deref(),
        true,
    );
    check_enum::<InvestmentTimeline>(&mut errors, "timeline", input.timeline.as_deref(), true);
    check_enum::<IncomeBand>(&mut errors, "income_band", input.income_band.as_deref(), false);
    check_enum::<NetWorthBand>(
        &mut errors,
        "net_worth_band",
        input.net_worth_band.as_deref(),
        false,
    );

    if !empty_selection_allowed {
        check_multi_select(&mut errors, "investment_goals", input.investment_goals.as_deref());
        check_multi_select(&mut errors, "preferred_sectors", input.preferred_sectors.as_deref());
        check_multi_select(
            &mut errors,
            "previous_investments",
            input.previous_investments.as_deref(),
        );
    }

    errors
}

fn check_enum<T: std::str::FromStr>(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    required: bool,
) {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None if required => errors.push(FieldError::new(field, "This field is required")),
        None => {}
        Some(v) if v.parse::<T>().is_err() => {
            errors.push(FieldError::new(field, "Not a valid option"));
        }
        Some(_) => {}
    }
}

/// An omitted multi-select is accepted; a supplied-but-empty list is not.
fn check_multi_select(errors: &mut Vec<FieldError>, field: &str, value: Option<&[String]>) {
    if let Some([]) = value {
        errors.push(FieldError::new(field, "Select at least one option"));
    }
}
