//! Message extraction from DRF-style error payloads.
//!
//! Rejected responses carry one of several shapes:
//! `{ "non_field_errors": [..] }`, `{ "<field>": [..] | ".." }` or
//! `{ "detail": ".." }`. Each shape is handled by one [`MessageExtractor`],
//! tried in [`DEFAULT_EXTRACTORS`] order until one claims the payload. A
//! claimed payload with nothing to say falls back to the transport message.

use serde_json::{Map, Value};

use super::REQUEST_FAILED_MESSAGE;

/// Status code signalling a rejected credential.
pub const UNAUTHORIZED: u16 = 401;
/// Error code the API attaches to expired or malformed access tokens.
pub const TOKEN_NOT_VALID: &str = "token_not_valid";

const NON_FIELD_ERRORS: &str = "non_field_errors";
const DETAIL: &str = "detail";
const CODE: &str = "code";
const RESERVED_KEYS: [&str; 3] = [NON_FIELD_ERRORS, DETAIL, CODE];

/// Pure strategy turning a payload into a message.
pub type MessageExtractor = fn(&Value) -> Option<String>;

/// Extractors in priority order.
pub const DEFAULT_EXTRACTORS: [MessageExtractor; 3] =
    [non_field_errors, field_messages, detail_message];

/// General errors not tied to one field, joined with spaces.
///
/// Claims any payload carrying the key, so an empty list yields `Some("")`
/// and later extractors are not consulted.
pub fn non_field_errors(payload: &Value) -> Option<String> {
    payload
        .get(NON_FIELD_ERRORS)
        .map(|value| joined(std::iter::once(value)))
}

/// Per-field messages in document order, joined with spaces.
pub fn field_messages(payload: &Value) -> Option<String> {
    let fields = payload.as_object()?;
    join_messages(field_values(fields))
}

/// The `detail` string.
pub fn detail_message(payload: &Value) -> Option<String> {
    payload
        .get(DETAIL)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(str::to_owned)
}

/// Message for a rejected response.
///
/// Takes the first message any of `extractors` yields. When none applies,
/// or the one that applies yields an empty message, falls back to
/// `transport_message`, then to [`REQUEST_FAILED_MESSAGE`].
///
/// # Examples
/// ```
/// use client::domain::error_message::{DEFAULT_EXTRACTORS, extract_message};
/// use serde_json::json;
///
/// let payload = json!({ "non_field_errors": ["a", "b"] });
/// assert_eq!(extract_message(Some(&payload), None, &DEFAULT_EXTRACTORS), "a b");
/// assert_eq!(extract_message(None, None, &DEFAULT_EXTRACTORS), "Request failed.");
/// ```
pub fn extract_message(
    payload: Option<&Value>,
    transport_message: Option<&str>,
    extractors: &[MessageExtractor],
) -> String {
    payload
        .and_then(|payload| extractors.iter().find_map(|extract| extract(payload)))
        .filter(|message| !message.is_empty())
        .or_else(|| {
            transport_message
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_owned())
}

/// Decode a response body as JSON, treating empty or unparseable bodies as
/// carrying no payload.
pub fn decode_payload(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// Whether a response is the API's "access token invalid" signal.
pub fn is_token_invalid(status: u16, payload: Option<&Value>) -> bool {
    status == UNAUTHORIZED
        && payload
            .and_then(|payload| payload.get(CODE))
            .and_then(Value::as_str)
            .is_some_and(|code| code == TOKEN_NOT_VALID)
}

fn field_values(fields: &Map<String, Value>) -> impl Iterator<Item = &Value> {
    fields
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(_, value)| value)
}

fn join_messages<'a>(values: impl Iterator<Item = &'a Value>) -> Option<String> {
    Some(joined(values)).filter(|message| !message.is_empty())
}

fn joined<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .flat_map(messages_in)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn messages_in(value: &Value) -> Vec<&str> {
    match value {
        Value::String(message) => vec![message.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
