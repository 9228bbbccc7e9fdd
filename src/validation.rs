//! Parse-or-reject validation of decoded request bodies.
//!
//! The handler layer never passes a raw JSON mapping downstream. Everything
//! the store sees has been turned into a [`NewMessage`] here.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::message_database::NewMessage;

/// Why a submitted message was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The candidate message is not a JSON object.
    #[error("message must be a JSON object")]
    NotAnObject,

    /// A required string field is absent or not a string.
    #[error("'{0}' is required and must be a string")]
    MissingOrWrongType(&'static str),

    /// An optional field has the wrong type.
    #[error("'{0}' must be a number")]
    WrongType(&'static str),

    /// A required string field is empty or whitespace-only.
    #[error("'{0}' cannot be empty")]
    Empty(&'static str),

    /// One element of a batch failed; the whole batch is rejected.
    #[error("message {index}: {reason}")]
    AtIndex {
        /// Position of the failing element in the submitted array.
        index: usize,
        /// What was wrong with it.
        reason: Box<ValidationError>,
    },
}

/// Validates a decoded request body.
///
/// A single object yields one message. An array is validated element by
/// element and rejected as a whole if any element fails.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate(raw: &Value) -> Result<Vec<NewMessage>, ValidationError> {
    match raw {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                validate_one(item).map_err(|reason| ValidationError::AtIndex {
                    index,
                    reason: Box::new(reason),
                })
            })
            .collect(),
        other => validate_one(other).map(|msg| vec![msg]),
    }
}

/// Validates one candidate message. Any `id` the caller sent is ignored.
///
/// Type rules run before the emptiness rule, so `{"user": "", "text": 5}`
/// is reported as a bad `text`. A caller-supplied timestamp is taken as Unix
/// seconds; its magnitude is not checked.
pub fn validate_one(raw: &Value) -> Result<NewMessage, ValidationError> {
    let fields = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let user = required_text(fields, "user")?;
    let text = required_text(fields, "text")?;
    let timestamp = match fields.get("timestamp") {
        None => None,
        Some(value) => {
            Some(timestamp_seconds(value).ok_or(ValidationError::WrongType("timestamp"))?)
        }
    };
    non_blank(user, "user")?;
    non_blank(text, "text")?;

    Ok(NewMessage {
        user: user.to_string(),
        text: text.to_string(),
        timestamp,
    })
}

fn required_text<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    let value = fields
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingOrWrongType(field))?;
    Ok(value)
}

fn non_blank(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

// Integral numbers only; 1000.0 is fine, 1000.5 is not.
fn timestamp_seconds(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(seconds) = number.as_i64() {
        return Some(seconds);
    }
    let float = number.as_f64()?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    if float.fract() == 0.0 && in_range {
        Some(float as i64)
    } else {
        None
    }
}
