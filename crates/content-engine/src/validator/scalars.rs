//! Per-primitive scalar rule checks
//!
//! Each check appends failures instead of returning early so one pass over
//! the payload reports every violated rule.

use chrono::{DateTime, NaiveDate};
use content_schema::{ScalarAttribute, ScalarKind};
use serde_json::Value;

use crate::error::ValidationFailure;

/// Validate a present, non-null scalar value against its attribute spec
pub fn check_scalar(
    attribute: &ScalarAttribute,
    path: &str,
    value: &Value,
    failures: &mut Vec<ValidationFailure>,
) {
    match attribute.kind {
        ScalarKind::String | ScalarKind::Text => {
            if let Some(s) = expect_string(attribute, path, value, failures) {
                check_length(attribute, path, s, failures);
            }
        }
        ScalarKind::Email => {
            if let Some(s) = expect_string(attribute, path, value, failures) {
                check_length(attribute, path, s, failures);
                if !is_email(s) {
                    failures.push(ValidationFailure::new(path, "must be a valid email"));
                }
            }
        }
        ScalarKind::Enumeration => {
            if let Some(s) = expect_string(attribute, path, value, failures) {
                if !attribute.values.iter().any(|v| v == s) {
                    failures.push(ValidationFailure::new(
                        path,
                        format!(
                            "must be one of [{}], got '{s}'",
                            attribute.values.join(", ")
                        ),
                    ));
                }
            }
        }
        ScalarKind::Integer | ScalarKind::BigInteger => {
            if value.is_i64() || value.is_u64() {
                check_range(attribute, path, value.as_f64().unwrap_or_default(), failures);
            } else {
                failures.push(type_mismatch(path, "an integer", value));
            }
        }
        ScalarKind::Float | ScalarKind::Decimal => match value.as_f64() {
            Some(number) => check_range(attribute, path, number, failures),
            None => failures.push(type_mismatch(path, "a number", value)),
        },
        ScalarKind::Boolean => {
            if !value.is_boolean() {
                failures.push(type_mismatch(path, "a boolean", value));
            }
        }
        ScalarKind::Date => {
            if let Some(s) = expect_string(attribute, path, value, failures) {
                if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                    failures.push(ValidationFailure::new(
                        path,
                        format!("must be a date in YYYY-MM-DD format, got '{s}'"),
                    ));
                }
            }
        }
        ScalarKind::Datetime => {
            if let Some(s) = expect_string(attribute, path, value, failures) {
                if DateTime::parse_from_rfc3339(s).is_err() {
                    failures.push(ValidationFailure::new(
                        path,
                        format!("must be an RFC 3339 datetime, got '{s}'"),
                    ));
                }
            }
        }
        // Any JSON value is acceptable
        ScalarKind::Json => {}
    }
}

fn expect_string<'a>(
    attribute: &ScalarAttribute,
    path: &str,
    value: &'a Value,
    failures: &mut Vec<ValidationFailure>,
) -> Option<&'a str> {
    match value.as_str() {
        Some(s) => Some(s),
        None => {
            failures.push(type_mismatch(
                path,
                &format!("a {}", attribute.kind),
                value,
            ));
            None
        }
    }
}

fn check_length(
    attribute: &ScalarAttribute,
    path: &str,
    value: &str,
    failures: &mut Vec<ValidationFailure>,
) {
    let length = value.chars().count();
    if let Some(min) = attribute.min_length {
        if length < min {
            failures.push(ValidationFailure::new(
                path,
                format!("must be at least {min} characters"),
            ));
        }
    }
    if let Some(max) = attribute.max_length {
        if length > max {
            failures.push(ValidationFailure::new(
                path,
                format!("must be at most {max} characters"),
            ));
        }
    }
}

fn check_range(
    attribute: &ScalarAttribute,
    path: &str,
    value: f64,
    failures: &mut Vec<ValidationFailure>,
) {
    if let Some(min) = attribute.min {
        if value < min {
            failures.push(ValidationFailure::new(
                path,
                format!("must be at least {min}"),
            ));
        }
    }
    if let Some(max) = attribute.max {
        if value > max {
            failures.push(ValidationFailure::new(
                path,
                format!("must be at most {max}"),
            ));
        }
    }
}

fn type_mismatch(path: &str, expected: &str, value: &Value) -> ValidationFailure {
    ValidationFailure::new(path, format!("must be {expected}, got {}", json_kind(value)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn is_email(value: &str) -> bool {
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_schema::Attribute;
    use serde_json::json;

    fn failures_for(attribute: &ScalarAttribute, value: Value) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();
        check_scalar(attribute, "field", &value, &mut failures);
        failures
    }

    #[test]
    fn test_string_length_bounds() {
        let attr = Attribute::string().min_length(2).max_length(4);
        assert!(failures_for(&attr, json!("ok")).is_empty());
        assert_eq!(failures_for(&attr, json!("x")).len(), 1);
        assert_eq!(failures_for(&attr, json!("toolong")).len(), 1);
    }

    #[test]
    fn test_integer_rejects_floats() {
        let attr = Attribute::integer();
        assert!(failures_for(&attr, json!(3)).is_empty());
        assert_eq!(failures_for(&attr, json!(3.5)).len(), 1);
        assert_eq!(failures_for(&attr, json!("3")).len(), 1);
    }

    #[test]
    fn test_numeric_range() {
        let attr = Attribute::integer().min(1.0).max(5.0);
        assert!(failures_for(&attr, json!(5)).is_empty());
        assert_eq!(failures_for(&attr, json!(0)).len(), 1);
        assert_eq!(failures_for(&attr, json!(9)).len(), 1);
    }

    #[test]
    fn test_enumeration_membership() {
        let attr = Attribute::enumeration(["draft", "published"]);
        assert!(failures_for(&attr, json!("draft")).is_empty());
        let failures = failures_for(&attr, json!("archived"));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("archived"));
    }

    #[test]
    fn test_email_shape() {
        let attr = ScalarAttribute::new(ScalarKind::Email);
        assert!(failures_for(&attr, json!("a@b.co")).is_empty());
        assert_eq!(failures_for(&attr, json!("not-an-email")).len(), 1);
    }

    #[test]
    fn test_date_and_datetime_formats() {
        let date = ScalarAttribute::new(ScalarKind::Date);
        assert!(failures_for(&date, json!("2026-08-30")).is_empty());
        assert_eq!(failures_for(&date, json!("30/08/2026")).len(), 1);

        let datetime = ScalarAttribute::new(ScalarKind::Datetime);
        assert!(failures_for(&datetime, json!("2026-08-30T12:00:00Z")).is_empty());
        assert_eq!(failures_for(&datetime, json!("noon")).len(), 1);
    }

    #[test]
    fn test_json_accepts_anything() {
        let attr = ScalarAttribute::new(ScalarKind::Json);
        assert!(failures_for(&attr, json!({"nested": [1, 2]})).is_empty());
    }
}
