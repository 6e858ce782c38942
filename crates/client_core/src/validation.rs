//! Field-level and whole-form validation for the transfer form.
//!
//! Year of birth is checked by an ordered chain of rules. Every rule whose
//! condition holds overwrites the message left by the rules before it, so the
//! last matching rule decides the final message.

use chrono::{Datelike, Local};

use crate::fields::{initial_errors, Field, FormErrors, FormValues};

pub const MIN_YEAR_OF_BIRTH: i64 = 1900;
pub const YEAR_OF_BIRTH_MAX_LEN: usize = 4;

pub const PATIENT_REQUIRED: &str = "Please select the suspect/patient";
pub const FIELD_REQUIRED: &str = "This field is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearRule {
    Required,
    AfterCurrentYear,
    BeforeMinimum,
}

const BLUR_YEAR_RULES: [YearRule; 2] = [YearRule::AfterCurrentYear, YearRule::BeforeMinimum];
const SUBMIT_YEAR_RULES: [YearRule; 3] = [
    YearRule::Required,
    YearRule::AfterCurrentYear,
    YearRule::BeforeMinimum,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    current_year: i64,
}

impl Validator {
    pub fn new(current_year: i32) -> Self {
        Self {
            current_year: i64::from(current_year),
        }
    }

    /// Captures the local calendar year once; later comparisons reuse it.
    pub fn from_clock() -> Self {
        Self::new(Local::now().year())
    }

    pub fn current_year(&self) -> i64 {
        self.current_year
    }

    /// Live feedback when a field loses focus. `None` means the stored error
    /// must be left as it is; `Some("")` clears it.
    pub fn validate_on_blur(&self, field: Field, value: &str) -> Option<String> {
        match field {
            Field::Patient => None,
            Field::YearOfBirth if value.is_empty() => None,
            Field::YearOfBirth => Some(self.run_year_rules(&BLUR_YEAR_RULES, value)),
        }
    }

    /// Recomputes every field's error from scratch.
    pub fn validate_form(&self, values: &FormValues) -> FormErrors {
        let patient_error = if values.is_empty(Field::Patient) {
            PATIENT_REQUIRED.to_string()
        } else {
            String::new()
        };
        let year_error = self.run_year_rules(&SUBMIT_YEAR_RULES, values.get(Field::YearOfBirth));

        initial_errors()
            .with(Field::Patient, patient_error)
            .with(Field::YearOfBirth, year_error)
    }

    fn run_year_rules(&self, rules: &[YearRule], value: &str) -> String {
        let mut error = String::new();
        for rule in rules {
            if self.rule_applies(*rule, value) {
                error = self.rule_message(*rule);
            }
        }
        error
    }

    fn rule_applies(&self, rule: YearRule, value: &str) -> bool {
        match rule {
            YearRule::Required => value.is_empty(),
            YearRule::AfterCurrentYear => {
                parse_year(value).is_some_and(|year| year > self.current_year)
            }
            YearRule::BeforeMinimum => {
                parse_year(value).is_some_and(|year| year < MIN_YEAR_OF_BIRTH)
            }
        }
    }

    fn rule_message(&self, rule: YearRule) -> String {
        match rule {
            YearRule::Required => FIELD_REQUIRED.to_string(),
            YearRule::AfterCurrentYear => format!("Cannot be greater than {}", self.current_year),
            YearRule::BeforeMinimum => format!("Cannot be smaller than {MIN_YEAR_OF_BIRTH}"),
        }
    }
}

/// Numeric reading of a year input. Empty input reads as `0`; anything that
/// is not a number yields `None` and fails every bound comparison.
pub fn parse_year(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    trimmed.parse::<i64>().ok()
}

/// Entry-time guard for the year field: over-long or non-numeric input is
/// dropped rather than truncated.
pub fn accepts_year_input(value: &str) -> bool {
    value.chars().count() <= YEAR_OF_BIRTH_MAX_LEN && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
