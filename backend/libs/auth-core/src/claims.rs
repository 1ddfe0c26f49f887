//! Claims codec
//!
//! Normalizes a verified token payload into a [`ClaimSet`]. Identity providers
//! have shipped the subject field `id` both as a JSON string and as a JSON
//! integer; both decode to the same string subject.

use crate::error::{AuthError, Result};
use crate::identity::Identity;
use serde_json::{Map, Value};

/// Wire name of the subject claim
pub const SUBJECT_CLAIM: &str = "id";

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClaimSet {
    /// Subject, empty when the payload carries no `id`
    pub subject: String,
    /// Issued at (Unix timestamp)
    pub issued_at: Option<i64>,
    /// Expiration time (Unix timestamp)
    pub expires_at: Option<i64>,
    /// Not before (Unix timestamp)
    pub not_before: Option<i64>,
}

impl ClaimSet {
    /// Decode a payload object
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::MalformedClaims` if:
    /// - the payload is not a JSON object
    /// - `id` is neither a string nor an integer that fits in `i64`
    /// - `iat`, `exp` or `nbf` is present but not an integer
    pub fn from_payload(payload: Value) -> Result<Self> {
        match payload {
            Value::Object(map) => Self::from_map(&map),
            other => Err(AuthError::MalformedClaims(format!(
                "payload must be an object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            subject: decode_subject(map.get(SUBJECT_CLAIM))?,
            issued_at: decode_timestamp(map, "iat")?,
            expires_at: decode_timestamp(map, "exp")?,
            not_before: decode_timestamp(map, "nbf")?,
        })
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.subject.clone())
    }
}

fn decode_subject(value: Option<&Value>) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => n.as_i64().map(|id| id.to_string()).ok_or_else(|| {
            AuthError::MalformedClaims(format!("{SUBJECT_CLAIM} is not a 64-bit integer: {n}"))
        }),
        Some(other) => Err(AuthError::MalformedClaims(format!(
            "{SUBJECT_CLAIM} must be a string or integer, got {}",
            json_type(other)
        ))),
    }
}

fn decode_timestamp(map: &Map<String, Value>, claim: &str) -> Result<Option<i64>> {
    match map.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| AuthError::MalformedClaims(format!("{claim} is not an integer: {n}"))),
        Some(other) => Err(AuthError::MalformedClaims(format!(
            "{claim} must be an integer, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
