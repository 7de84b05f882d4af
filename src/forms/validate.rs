//! Schema Validator.
//!
//! `validate` is total: every field is checked against the full record and
//! all violations come back in declaration order. Violations are data,
//! never `Err`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{self, Record};
use super::schema::{Constraint, FieldKind, FieldSpec, FormDefinition};

pub const INVALID_VALUE_MESSAGE: &str = "Invalid value";
pub const INVALID_CHOICE_MESSAGE: &str = "Invalid choice";
pub const INVALID_DATE_MESSAGE: &str = "Invalid date (expected YYYY-MM-DD)";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One violated constraint, keyed by the field's full path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field_key: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_key: field_key.into(),
            message: message.into(),
        }
    }
}

/// Validate `record` against a registered form.
///
/// A field is required when its own requirement holds or when the condition
/// of the rule controlling it holds on `record`; rule requiredness reports
/// the rule's message. Non-empty values are checked for kind, choices, and
/// constraints.
pub fn validate(form: &FormDefinition, record: &Record) -> Vec<ValidationError> {
    let active: Vec<bool> = form.rules().iter().map(|rule| rule.is_active(record)).collect();
    let mut errors = Vec::new();

    for field in form.fields() {
        let value = record::get(record, &field.key);

        if record::is_empty(field.kind, value) {
            let rule_message = form
                .rules()
                .iter()
                .zip(&active)
                .find(|(rule, on)| **on && rule.dependents.contains(&field.key))
                .map(|(rule, _)| rule.message.as_str());

            if let Some(message) = rule_message {
                errors.push(ValidationError::new(&field.key, message));
            } else if field.required.applies(record) {
                errors.push(ValidationError::new(&field.key, &field.message));
            }
            continue;
        }

        if let Some(value) = value {
            if let Some(message) = check_value(field, value) {
                errors.push(ValidationError::new(&field.key, message));
            }
        }
    }

    if !errors.is_empty() {
        tracing::debug!(form = form.name(), error_count = errors.len(), "Record failed validation");
    }
    errors
}

/// First violation of a non-empty value, if any.
fn check_value(field: &FieldSpec, value: &Value) -> Option<String> {
    match field.kind {
        FieldKind::Text => match value.as_str() {
            None => Some(INVALID_VALUE_MESSAGE.to_string()),
            Some(text) => field.constraints.iter().find_map(|c| match c {
                Constraint::MaxLength(max) if text.chars().count() > *max => {
                    Some(format!("At most {max} characters"))
                }
                _ => None,
            }),
        },
        FieldKind::Number => {
            let Some(n) = value.as_f64() else {
                return Some(INVALID_VALUE_MESSAGE.to_string());
            };
            field.constraints.iter().find_map(|c| check_number(c, n))
        }
        FieldKind::Boolean => (!value.is_boolean()).then(|| INVALID_VALUE_MESSAGE.to_string()),
        FieldKind::Enum => match value.as_str() {
            Some(token) if field.allows_token(token) => None,
            _ => Some(INVALID_CHOICE_MESSAGE.to_string()),
        },
        FieldKind::MultiEnum => {
            let items = value.as_array();
            let all_allowed = items.is_some_and(|items| {
                items
                    .iter()
                    .all(|v| v.as_str().is_some_and(|t| field.allows_token(t)))
            });
            (!all_allowed).then(|| INVALID_CHOICE_MESSAGE.to_string())
        }
        FieldKind::Date => {
            let parsed = value
                .as_str()
                .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT));
            match parsed {
                Some(Ok(_)) => None,
                _ => Some(INVALID_DATE_MESSAGE.to_string()),
            }
        }
    }
}

fn check_number(constraint: &Constraint, n: f64) -> Option<String> {
    match *constraint {
        Constraint::Range {
            min,
            max,
            min_exclusive,
        } => {
            let below = min.is_some_and(|m| if min_exclusive { n <= m } else { n < m });
            let above = max.is_some_and(|m| n > m);
            (below || above).then(|| range_message(min, max, min_exclusive))
        }
        Constraint::Integer => (n.fract() != 0.0).then(|| "Must be a whole number".to_string()),
        Constraint::MaxLength(_) => None,
    }
}

fn range_message(min: Option<f64>, max: Option<f64>, min_exclusive: bool) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) if min_exclusive => format!("Must be greater than {lo} and at most {hi}"),
        (Some(lo), Some(hi)) => format!("Must be between {lo} and {hi}"),
        (Some(lo), None) if min_exclusive => format!("Must be greater than {lo}"),
        (Some(lo), None) => format!("Must be at least {lo}"),
        (None, Some(hi)) => format!("Must be at most {hi}"),
        (None, None) => INVALID_VALUE_MESSAGE.to_string(),
    }
}
