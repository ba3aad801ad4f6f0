//! Single-response validators
//!
//! Each check is a pure predicate over one captured response. A failure
//! names the field, the expected value, and the actual value.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::common::{Error, Result};
use crate::http::{ResponseHandle, JSON_CONTENT_TYPE};

/// Status reported by a serving Connect health check
pub const SERVING_STATUS: &str = "SERVING_STATUS_SERVING";

/// Status code a service returns for an unsupported request content type
pub const UNSUPPORTED_MEDIA_TYPE: u16 = 415;

/// Upper bound (exclusive) on a monitoring response body, in bytes
pub const MONITORING_MAX_BYTES: usize = 1000;

/// Upper bound (inclusive) on top-level fields of a monitoring response
pub const MONITORING_MAX_FIELDS: usize = 3;

/// UTC, second precision, literal `Z`
static TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z$").expect("timestamp regex is valid")
});

/// The response status code equals `expected`
pub fn status_code(response: &ResponseHandle, expected: u16) -> Result<()> {
    if response.status() != expected {
        return Err(Error::assertion(format!(
            "Expected status code {}, got {}",
            expected,
            response.status()
        )));
    }
    Ok(())
}

/// The response status code is anything but `unexpected`
pub fn status_code_not(response: &ResponseHandle, unexpected: u16) -> Result<()> {
    if response.status() == unexpected {
        return Err(Error::assertion(format!(
            "Expected status code other than {}, got {}",
            unexpected,
            response.status()
        )));
    }
    Ok(())
}

/// The service refused the request's content type (HTTP 415)
pub fn rejected(response: &ResponseHandle) -> Result<()> {
    if response.status() != UNSUPPORTED_MEDIA_TYPE {
        return Err(Error::assertion(format!(
            "Expected status {} for rejected request, got {}",
            UNSUPPORTED_MEDIA_TYPE,
            response.status()
        )));
    }
    Ok(())
}

/// The response did not succeed with 200
pub fn request_failed(response: &ResponseHandle) -> Result<()> {
    if response.status() == 200 {
        return Err(Error::assertion(format!(
            "Expected the request to fail, but it succeeded with status 200: {}",
            truncate(&response.body_text(), 200)
        )));
    }
    Ok(())
}

/// The response carries a body
pub fn not_empty(response: &ResponseHandle) -> Result<()> {
    if response.body().is_empty() {
        return Err(Error::assertion("Response body is empty"));
    }
    Ok(())
}

/// The body is a JSON object
///
/// Distinguishes "not JSON" from "JSON but not an object".
pub fn json_object(response: &ResponseHandle) -> Result<&Map<String, Value>> {
    let value = response.json()?;
    value.as_object().ok_or_else(|| {
        Error::assertion(format!(
            "Expected a JSON object, got {}",
            json_type_name(value)
        ))
    })
}

/// The body has a top-level `status` equal to `expected`
pub fn status_field(response: &ResponseHandle, expected: &str) -> Result<()> {
    let body = json_object(response)?;
    let actual = body
        .get("status")
        .ok_or_else(|| Error::assertion("Response does not contain 'status' field"))?;
    if actual.as_str() != Some(expected) {
        return Err(Error::assertion(format!(
            "Expected status '{}', got {}",
            expected,
            render(actual)
        )));
    }
    Ok(())
}

/// A 200 response whose `status` is the serving enum
pub fn serving(response: &ResponseHandle) -> Result<()> {
    status_code(response, 200)?;
    status_field(response, SERVING_STATUS)
}

/// The body has a top-level field whose value renders as `expected`
///
/// Strings compare by content; other JSON values by their JSON text.
pub fn field_value(response: &ResponseHandle, field: &str, expected: &str) -> Result<()> {
    let body = json_object(response)?;
    let actual = body
        .get(field)
        .ok_or_else(|| Error::assertion(format!("Response does not contain '{}' field", field)))?;
    let matches = match actual {
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    };
    if !matches {
        return Err(Error::assertion(format!(
            "Expected {} '{}', got {}",
            field,
            expected,
            render(actual)
        )));
    }
    Ok(())
}

/// The `Content-Type` header contains `expected`
///
/// Substring match: servers may append parameters such as a charset.
pub fn content_type(response: &ResponseHandle, expected: &str) -> Result<()> {
    let actual = response.header("content-type").unwrap_or("");
    if !actual.contains(expected) {
        return Err(Error::assertion(format!(
            "Expected content type to contain '{}', got '{}'",
            expected, actual
        )));
    }
    Ok(())
}

/// The `Content-Type` header declares JSON
pub fn json_content_type(response: &ResponseHandle) -> Result<()> {
    content_type(response, JSON_CONTENT_TYPE)
}

/// The body has a `timestamp` in `YYYY-MM-DDTHH:MM:SSZ` form
pub fn timestamp(response: &ResponseHandle) -> Result<()> {
    let body = json_object(response)?;
    let value = body
        .get("timestamp")
        .ok_or_else(|| Error::assertion("Response does not contain 'timestamp' field"))?;
    let timestamp = value.as_str().ok_or_else(|| {
        Error::assertion(format!(
            "Timestamp should be a string, got {}",
            json_type_name(value)
        ))
    })?;
    check_timestamp(timestamp)
}

/// A timestamp string is non-empty UTC with second precision
pub fn check_timestamp(timestamp: &str) -> Result<()> {
    if timestamp.is_empty() {
        return Err(Error::assertion("Timestamp should not be empty"));
    }
    if !TIMESTAMP_REGEX.is_match(timestamp) {
        return Err(Error::assertion(format!(
            "Timestamp should be in ISO 8601 format (YYYY-MM-DDTHH:MM:SSZ), got: {}",
            timestamp
        )));
    }
    Ok(())
}

/// The response is cheap enough to poll at high frequency
///
/// Only the field count is bounded; which fields appear is the service's
/// contract.
pub fn lightweight(response: &ResponseHandle) -> Result<()> {
    let size = response.body().len();
    if size >= MONITORING_MAX_BYTES {
        return Err(Error::assertion(format!(
            "Response should be lightweight for monitoring (< {} bytes), got {} bytes",
            MONITORING_MAX_BYTES, size
        )));
    }

    let body = json_object(response)?;
    if body.len() > MONITORING_MAX_FIELDS {
        return Err(Error::assertion(format!(
            "Monitoring response should have at most {} fields, got {} fields",
            MONITORING_MAX_FIELDS,
            body.len()
        )));
    }

    if !body.contains_key("status") {
        return Err(Error::assertion(
            "Monitoring response should contain 'status' field",
        ));
    }
    Ok(())
}

/// Human-readable JSON type name for diagnostics
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Quote strings, print everything else as JSON
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
