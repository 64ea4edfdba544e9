//! Dynamic field schema validation.
//!
//! A collection declares up to three typed fields. Item writes submit a JSON
//! object keyed by field name; every submitted value is checked against the
//! declared [`FieldType`] and coerced into a [`FieldValue`] before anything is
//! persisted.
//!
//! - `Create` requires exactly one value per declared field.
//! - `Update` type-checks only the fields that were submitted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

use crate::database::models::{FieldType, ItemField};
use crate::error::FieldViolation;

const MAX_TAG_LENGTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// A submitted value after it passed its field's type check
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Storage form. Dates are normalized to RFC 3339 in UTC.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Integer(n) => Value::from(*n),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedValue {
    pub field_id: i32,
    pub field_name: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("The number of fields and values does not match.")]
    CountMismatch { expected: usize, actual: usize },

    #[error("{} invalid field value(s)", .0.len())]
    Violations(Vec<FieldViolation>),
}

/// Check `submitted` against the collection's field schema.
///
/// Results follow schema order. All violations are collected rather than
/// stopping at the first one.
pub fn validate(
    submitted: &Map<String, Value>,
    schema: &[ItemField],
    mode: ValidationMode,
) -> Result<Vec<ValidatedValue>, FieldError> {
    if mode == ValidationMode::Create && submitted.len() != schema.len() {
        return Err(FieldError::CountMismatch {
            expected: schema.len(),
            actual: submitted.len(),
        });
    }

    let mut validated = Vec::with_capacity(schema.len());
    let mut violations = Vec::new();

    for field in schema {
        let raw = match submitted.get(&field.field_name) {
            Some(raw) => raw,
            None if mode == ValidationMode::Update => continue,
            None => {
                violations.push(FieldViolation::new(
                    &field.field_name,
                    format!("Missing value for field: {}", field.field_name),
                ));
                continue;
            }
        };

        match validate_value(field.field_type, raw) {
            Some(value) => validated.push(ValidatedValue {
                field_id: field.field_id,
                field_name: field.field_name.clone(),
                value,
            }),
            None => violations.push(FieldViolation::new(
                &field.field_name,
                format!(
                    "Invalid type for field: {}, expected: {}",
                    field.field_name, field.field_type
                ),
            )),
        }
    }

    if violations.is_empty() {
        Ok(validated)
    } else {
        Err(FieldError::Violations(violations))
    }
}

/// Dispatch to the validator for `field_type`; `None` is a type mismatch
pub fn validate_value(field_type: FieldType, raw: &Value) -> Option<FieldValue> {
    match field_type {
        FieldType::Integer => validate_integer(raw),
        FieldType::String | FieldType::Text => validate_text(raw),
        FieldType::Boolean => validate_boolean(raw),
        FieldType::Date => validate_date(raw),
    }
}

/// Integers must survive a parse/format round trip unchanged, so `"12.5"`,
/// `"12abc"`, `"042"` and `"+4"` are all rejected. JSON numbers only need a
/// whole value, so `42.0` and `1e3` pass.
fn validate_integer(raw: &Value) -> Option<FieldValue> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| whole_float(n.as_f64()?)).map(FieldValue::Integer),
        Value::String(s) => {
            let parsed: i64 = s.parse().ok()?;
            (parsed.to_string() == *s).then_some(FieldValue::Integer(parsed))
        }
        _ => None,
    }
}

fn whole_float(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

fn validate_text(raw: &Value) -> Option<FieldValue> {
    raw.as_str().map(|s| FieldValue::Text(s.to_string()))
}

fn validate_boolean(raw: &Value) -> Option<FieldValue> {
    match raw {
        Value::Bool(b) => Some(FieldValue::Boolean(*b)),
        Value::String(s) if s == "true" => Some(FieldValue::Boolean(true)),
        Value::String(s) if s == "false" => Some(FieldValue::Boolean(false)),
        _ => None,
    }
}

fn validate_date(raw: &Value) -> Option<FieldValue> {
    parse_date(raw.as_str()?.trim()).map(FieldValue::Date)
}

/// Accepts RFC 3339, ISO local date-times (treated as UTC) and bare dates
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Trim tag names, drop duplicates (first occurrence wins) and reject blanks.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, FieldError> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(tags.len());
    let mut violations = Vec::new();

    for (index, tag) in tags.iter().enumerate() {
        let name = tag.trim();
        if name.is_empty() {
            violations.push(FieldViolation::new(
                format!("tags[{}]", index),
                "Tag name cannot be empty",
            ));
        } else if name.chars().count() > MAX_TAG_LENGTH {
            violations.push(FieldViolation::new(
                format!("tags[{}]", index),
                format!("Tag name must be at most {} characters", MAX_TAG_LENGTH),
            ));
        } else if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    if violations.is_empty() {
        Ok(names)
    } else {
        Err(FieldError::Violations(violations))
    }
}
