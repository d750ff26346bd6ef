// 📐 Request Validation
// Explicit per-field schemas for JSON request bodies
//
// Bodies arrive as loosely typed JSON. Each resource declares its fields and
// rules; every failing rule is collected so the caller sees the whole list
// at once instead of the first failure only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

// ============================================================================
// VALIDATOR
// ============================================================================

/// Collects field errors while typed values are extracted.
///
/// Extractors return `None` both for absent optional fields and for fields
/// that failed; `finish` decides which of the two happened.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Record `msg` when a required field is missing. Returns presence.
    pub fn required(&mut self, field: &str, value: Option<&Value>, msg: &str) -> bool {
        let found = is_present(value);
        if !found {
            self.push(field, msg);
        }
        found
    }

    /// Number strictly greater than zero. Accepts numeric strings.
    pub fn positive_number(&mut self, field: &str, value: Option<&Value>, msg: &str) -> Option<f64> {
        let value = present(value)?;
        match as_number(value) {
            Some(n) if n > 0.0 => Some(n),
            _ => {
                self.push(field, msg);
                None
            }
        }
    }

    /// Number greater than or equal to zero. Accepts numeric strings.
    pub fn non_negative_number(&mut self, field: &str, value: Option<&Value>, msg: &str) -> Option<f64> {
        let value = present(value)?;
        match as_number(value) {
            Some(n) if n >= 0.0 => Some(n),
            _ => {
                self.push(field, msg);
                None
            }
        }
    }

    /// Any string (trimmed). Empty strings count as absent.
    pub fn string(&mut self, field: &str, value: Option<&Value>, msg: &str) -> Option<String> {
        let value = present(value)?;
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(_) => None,
            None => {
                self.push(field, msg);
                None
            }
        }
    }

    /// One of an enumerated set of strings
    pub fn one_of(&mut self, field: &str, value: Option<&Value>, allowed: &[&str], msg: &str) -> Option<String> {
        let value = present(value)?;
        match value.as_str() {
            Some(s) if allowed.contains(&s) => Some(s.to_string()),
            _ => {
                self.push(field, msg);
                None
            }
        }
    }

    /// ISO 8601 date: `YYYY-MM-DD` or a full RFC 3339 timestamp
    pub fn date(&mut self, field: &str, value: Option<&Value>, msg: &str) -> Option<DateTime<Utc>> {
        let value = present(value)?;
        match value.as_str().and_then(parse_iso8601) {
            Some(date) => Some(date),
            None => {
                self.push(field, msg);
                None
            }
        }
    }

    /// Every collected error, or `value` when no rule failed.
    ///
    /// `value` is `None` only if a required field was dropped without a
    /// recorded error, which is reported as an invalid body.
    pub fn finish<T>(mut self, value: Option<T>) -> ValidationResult<T> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        match value {
            Some(value) => Ok(value),
            None => {
                self.push("body", "Invalid request body");
                Err(self.errors)
            }
        }
    }
}

/// True when the field exists and is not JSON `null` or an empty string
pub fn is_present(value: Option<&Value>) -> bool {
    present(value).is_some()
}

fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
