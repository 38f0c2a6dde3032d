//! Content API errors
//!
//! The remote API is a Django REST backend, so error bodies come in a few
//! shapes: `{"detail": ...}`, `{"non_field_errors": [...]}`, or per-field
//! lists such as `{"email": ["..."]}`. The helpers here turn them into a
//! single human-readable message.

use serde_json::Value;
use thiserror::Error;

/// Error returned by [`ApiClient`](super::ApiClient) operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API could not be reached (connect error, timeout, TLS)
    #[error("Cannot connect to the server: {0}")]
    Network(#[source] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Value,
    },

    /// The API answered but the body was not what we expected
    #[error("Unexpected response from the server: {0}")]
    Decode(String),
}

impl ClientError {
    /// Build an `Api` error from a status code and a (possibly empty) body
    pub fn from_response(status: u16, body: Value) -> Self {
        let message = extract_error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));
        ClientError::Api { status, message, body }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// The token itself was rejected; a 403 is a refusal for this action only
    pub fn is_unauthenticated(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// Message taken from the error body, if the API sent one
    pub fn api_message(&self) -> Option<String> {
        match self {
            ClientError::Api { body, .. } => extract_error_message(body),
            _ => None,
        }
    }

    /// Rewrite the message from field errors, `"<Label>: <first error>"`
    ///
    /// Labelled field errors win over the generic message. Non-`Api` errors
    /// pass through untouched.
    pub fn with_field_labels(self, labels: &[(&str, &str)]) -> Self {
        match self {
            ClientError::Api { status, message, body } => {
                let message = first_field_error(&body, labels).unwrap_or(message);
                ClientError::Api { status, message, body }
            }
            other => other,
        }
    }

    /// Use labelled field errors only when the body has no generic message
    pub fn with_field_fallback(self, labels: &[(&str, &str)]) -> Self {
        match self {
            ClientError::Api { status, body, .. } => {
                let message = extract_error_message(&body)
                    .or_else(|| all_field_errors(&body, labels))
                    .unwrap_or_else(|| format!("HTTP {status}"));
                ClientError::Api { status, message, body }
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err)
        }
    }
}

/// Pull the most relevant message out of an error body
///
/// Looks at `non_field_errors[0]`, `detail`, `message`, `error`, then the
/// first entry of `errors`, in that order.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    if let Some(msg) = obj.get("non_field_errors").and_then(first_text) {
        return Some(msg);
    }
    for key in ["detail", "message", "error"] {
        if let Some(msg) = obj.get(key).and_then(first_text) {
            return Some(msg);
        }
    }
    match obj.get("errors")? {
        Value::Object(fields) => fields.values().find_map(first_text),
        other => first_text(other),
    }
}

/// First error of the first labelled field present in the body
fn first_field_error(body: &Value, labels: &[(&str, &str)]) -> Option<String> {
    labels.iter().find_map(|(field, label)| {
        body.get(field)
            .and_then(first_text)
            .map(|msg| format!("{label}: {msg}"))
    })
}

/// Every labelled field error, joined with ", "
fn all_field_errors(body: &Value, labels: &[(&str, &str)]) -> Option<String> {
    let parts: Vec<String> = labels
        .iter()
        .filter_map(|(field, label)| {
            body.get(field)
                .and_then(first_text)
                .map(|msg| format!("{label}: {msg}"))
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// A string, or the first string of an array
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}
