// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission field parsing.
//!
//! Two accepted wire shapes, for backward compatibility:
//!
//! - modern: `{ dataType, tlp?, message?, parameters?, force?, data | attachment }`
//! - legacy: `{ attributes: { dataType, tlp?, message?, parameters? },
//!   data | attachment, force? }` — takes precedence when a top-level
//!   `attributes` object is present.
//!
//! Parsing accumulates every fault instead of stopping at the first, so
//! the submitter sees all problems at once.

use crate::observable::{Attachment, Observable};
use crate::tlp::Tlp;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single fault in a submission document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing attribute: {0}")]
    Missing(String),
    #[error("invalid format for attribute {field}: expected {expected}")]
    InvalidFormat { field: String, expected: String },
}

impl FieldError {
    fn invalid(field: &str, expected: &str) -> Self {
        FieldError::InvalidFormat {
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Parsed submission fields with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionFields {
    pub data_type: String,
    pub observable: Observable,
    pub tlp: Tlp,
    pub message: String,
    pub parameters: Map<String, Value>,
    pub force: bool,
}

impl SubmissionFields {
    /// Parse a submission document, accumulating all field errors.
    pub fn parse(value: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(top) = value.as_object() else {
            return Err(vec![FieldError::invalid("submission", "object")]);
        };

        let mut errors = Vec::new();

        // Legacy shape wins when a top-level `attributes` object is present.
        let attrs = match top.get("attributes") {
            Some(Value::Object(attrs)) => attrs,
            Some(_) => {
                errors.push(FieldError::invalid("attributes", "object"));
                top
            }
            None => top,
        };

        let data_type = match attrs.get("dataType") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push(FieldError::invalid("dataType", "string"));
                None
            }
            None => {
                errors.push(FieldError::Missing("dataType".to_string()));
                None
            }
        };

        let tlp = match attrs.get("tlp") {
            None | Some(Value::Null) => Tlp::default(),
            Some(v) => match v.as_i64().map(Tlp::try_from) {
                Some(Ok(tlp)) => tlp,
                _ => {
                    errors.push(FieldError::invalid("tlp", "integer 0-3"));
                    Tlp::default()
                }
            },
        };

        let message = match attrs.get("message") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                errors.push(FieldError::invalid("message", "string"));
                String::new()
            }
        };

        let parameters = match attrs.get("parameters") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                errors.push(FieldError::invalid("parameters", "object"));
                Map::new()
            }
        };

        // `force`, `data`, and `attachment` live at the top level in both shapes.
        let force = match top.get("force") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                errors.push(FieldError::invalid("force", "boolean"));
                false
            }
        };

        let observable = parse_observable(top, &mut errors);

        match (data_type, observable) {
            (Some(data_type), Some(observable)) if errors.is_empty() => Ok(SubmissionFields {
                data_type,
                observable,
                tlp,
                message,
                parameters,
                force,
            }),
            _ => Err(errors),
        }
    }
}

fn parse_observable(top: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<Observable> {
    let data = top.get("data").filter(|v| !v.is_null());
    let attachment = top.get("attachment").filter(|v| !v.is_null());

    match (data, attachment) {
        (Some(_), Some(_)) => {
            errors.push(FieldError::invalid(
                "data",
                "exactly one of data or attachment",
            ));
            None
        }
        (Some(Value::String(s)), None) => Some(Observable::data(s.clone())),
        (Some(_), None) => {
            errors.push(FieldError::invalid("data", "string"));
            None
        }
        (None, Some(v)) => match serde_json::from_value::<Attachment>(v.clone()) {
            Ok(attachment) => Some(Observable::attachment(attachment)),
            Err(_) => {
                errors.push(FieldError::invalid("attachment", "attachment reference"));
                None
            }
        },
        (None, None) => {
            errors.push(FieldError::Missing("data".to_string()));
            None
        }
    }
}

/// Canonical JSON encoding of submission parameters: object keys sorted
/// at every nesting level. Cache equality is string equality of this
/// encoding, so key order in the submission does not defeat the cache.
pub fn canonical_params(params: &Map<String, Value>) -> String {
    let canonical = canonical_value(&Value::Object(params.clone()));
    // Serializing a Value cannot fail; the fallback is unreachable.
    serde_json::to_string(&canonical).unwrap_or_else(|_| "{}".to_string())
}

fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (key, val) in entries {
                out.insert(key.clone(), canonical_value(val));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
