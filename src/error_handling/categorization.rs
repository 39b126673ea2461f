//! Error categorization.
//!
//! Maps transport failures and non-success HTTP responses onto the
//! [`ClientError`] taxonomy.

use reqwest::StatusCode;
use serde_json::Value;

use super::types::ClientError;

/// Categorizes a `reqwest::Error` into a `ClientError`.
///
/// Status errors (from `error_for_status`) go through [`categorize_status`];
/// connection, timeout and body failures are network problems; decode
/// failures mean the backend answered with something we cannot read.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ClientError {
    if let Some(status) = error.status() {
        return categorize_status(status, "");
    }

    if error.is_timeout() {
        ClientError::Network(format!("request timed out: {}", error))
    } else if error.is_connect() || error.is_request() || error.is_body() {
        ClientError::Network(error.to_string())
    } else if error.is_decode() {
        ClientError::Unknown(format!("unreadable response: {}", error))
    } else if error.is_builder() {
        ClientError::Unknown(format!("invalid request: {}", error))
    } else {
        ClientError::Unknown(error.to_string())
    }
}

/// Categorizes a non-success HTTP response.
///
/// # Arguments
///
/// * `status` - Response status code
/// * `body` - Raw response body (may be empty)
///
/// # Returns
///
/// - 404 → `NotFound`
/// - other 4xx/5xx → `Server`, carrying the backend's `detail` when present,
///   otherwise "Internal server error" for 500 and the canonical reason phrase
///   for everything else
/// - anything else → `Unknown`
pub fn categorize_status(status: StatusCode, body: &str) -> ClientError {
    if status == StatusCode::NOT_FOUND {
        return ClientError::NotFound;
    }

    if status.is_client_error() || status.is_server_error() {
        let message = extract_detail(body).unwrap_or_else(|| default_message(status));
        return ClientError::Server {
            status: status.as_u16(),
            message,
        };
    }

    ClientError::Unknown(format!("unexpected HTTP status {}", status))
}

/// Extracts the human-readable `detail` from a JSON error body.
///
/// The backend sends either `{"detail": "text"}` or, for request validation
/// failures, `{"detail": [{"msg": "...", ...}, ...]}`. List entries are
/// joined with `"; "`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    let message = match detail {
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.trim().to_string()),
                Value::Object(_) => item
                    .get("msg")
                    .and_then(Value::as_str)
                    .map(|msg| msg.trim().to_string()),
                _ => None,
            })
            .filter(|msg| !msg.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

fn default_message(status: StatusCode) -> String {
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return "Internal server error".to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
