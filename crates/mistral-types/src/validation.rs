//! Opt-in range checks for [`RequestParameters`]
//!
//! The parameter shape accepts any value. Callers that want to fail fast
//! before a network round trip run [`validate`] themselves; the service
//! remains the authority on what it accepts.

use std::fmt;

use crate::params::RequestParameters;

/// Accepted temperature range
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 1.5);
/// Accepted nucleus sampling range
pub const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);
/// Accepted range for both penalties
pub const PENALTY_RANGE: (f64, f64) = (-2.0, 2.0);

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Wire name of the field
    pub field: &'static str,
    /// What is wrong with the value
    pub reason: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Every violation found in one parameter set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request parameters: {}", join(.violations))]
pub struct ValidationError {
    /// Violations in field order
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Whether the given field was rejected
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Check every present field against the accepted ranges
///
/// # Errors
///
/// Returns a [`ValidationError`] listing all rejected fields
pub fn validate(params: &RequestParameters) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    check_text(&mut violations, "model", params.model.as_deref());
    check_min(&mut violations, "max_tokens", params.max_tokens, 0);
    check_range(&mut violations, "temperature", params.temperature, TEMPERATURE_RANGE);
    check_range(&mut violations, "top_p", params.top_p, TOP_P_RANGE);
    check_min(&mut violations, "random_seed", params.random_seed, 0);
    check_min(&mut violations, "n", params.n, 1);
    check_text(&mut violations, "reasoning_mode", params.reasoning_mode.as_deref());
    check_range(&mut violations, "presence_penalty", params.presence_penalty, PENALTY_RANGE);
    check_range(&mut violations, "frequency_penalty", params.frequency_penalty, PENALTY_RANGE);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

fn check_text(violations: &mut Vec<Violation>, field: &'static str, value: Option<&str>) {
    if let Some(value) = value
        && value.trim().is_empty()
    {
        violations.push(Violation {
            field,
            reason: "must not be empty".to_owned(),
        });
    }
}

fn check_min(violations: &mut Vec<Violation>, field: &'static str, value: Option<i64>, min: i64) {
    if let Some(value) = value
        && value < min
    {
        violations.push(Violation {
            field,
            reason: format!("must be at least {min}, got {value}"),
        });
    }
}

fn check_range(violations: &mut Vec<Violation>, field: &'static str, value: Option<f64>, (min, max): (f64, f64)) {
    let Some(value) = value else {
        return;
    };

    if !value.is_finite() {
        violations.push(Violation {
            field,
            reason: format!("must be a finite number, got {value}"),
        });
    } else if !(min..=max).contains(&value) {
        violations.push(Violation {
            field,
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
}
