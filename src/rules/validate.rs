//! Rule Validation
//!
//! Checks and normalizes externally supplied rule documents before they are
//! trusted, whether they came from the on-disk file or a remote fetch.
//! Numeric strings are coerced to numbers in place so hand-edited files may
//! quote their numbers.

use serde_json::Value;
use thiserror::Error;

/// Why a rule document was rejected. The first problem found is reported;
/// later rules are not inspected.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("rule document is not an array")]
    NotAnArray,

    #[error("rule {ordinal} is not an object")]
    NotAnObject { ordinal: usize },

    #[error("rule {ordinal}: missing or empty field '{field}'")]
    MissingField { ordinal: usize, field: &'static str },

    #[error("rule {ordinal}: field '{field}' must be a string")]
    NotAString { ordinal: usize, field: &'static str },

    #[error("rule {ordinal}: field '{field}' must be a non-negative number, got {value}")]
    BadNumber {
        ordinal: usize,
        field: &'static str,
        value: String,
    },
}

const REQUIRED_FIELDS: [&str; 4] = [
    "server",
    "listen_channel",
    "trigger_text",
    "response_text",
];
const OPTIONAL_STRING_FIELDS: [&str; 2] = ["trigger_flags", "response_channel"];
const NUMERIC_FIELDS: [&str; 2] = ["cooldown_seconds", "delay_seconds"];

/// Validate a deserialized rule document, coercing numeric strings in place.
///
/// On success the document is guaranteed to deserialize into `Vec<Rule>`.
/// Coercion is applied per field as it is validated, so a document rejected
/// at rule N may have coerced fields in rules 1..N.
pub fn validate_rules(doc: &mut Value) -> Result<(), RuleError> {
    let rules = doc.as_array_mut().ok_or(RuleError::NotAnArray)?;

    for (i, rule) in rules.iter_mut().enumerate() {
        let ordinal = i + 1;
        let obj = rule
            .as_object_mut()
            .ok_or(RuleError::NotAnObject { ordinal })?;

        for field in REQUIRED_FIELDS {
            let present = obj
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(RuleError::MissingField { ordinal, field });
            }
        }

        for field in OPTIONAL_STRING_FIELDS {
            if let Some(value) = obj.get(field) {
                if !value.is_string() && !value.is_null() {
                    return Err(RuleError::NotAString { ordinal, field });
                }
            }
        }

        for field in NUMERIC_FIELDS {
            let Some(value) = obj.get(field) else {
                continue;
            };
            let received = value.to_string();
            let coerced = match value {
                Value::Number(n) => {
                    if n.as_f64().is_some_and(|n| n.is_finite() && n >= 0.0) {
                        None
                    } else {
                        return Err(RuleError::BadNumber {
                            ordinal,
                            field,
                            value: received,
                        });
                    }
                }
                Value::String(s) => {
                    let parsed = s
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite() && *n >= 0.0)
                        .and_then(serde_json::Number::from_f64);
                    match parsed {
                        Some(num) => Some(num),
                        None => {
                            return Err(RuleError::BadNumber {
                                ordinal,
                                field,
                                value: received,
                            });
                        }
                    }
                }
                _ => {
                    return Err(RuleError::BadNumber {
                        ordinal,
                        field,
                        value: received,
                    });
                }
            };
            if let Some(num) = coerced {
                obj.insert(field.to_string(), Value::Number(num));
            }
        }
    }

    Ok(())
}
