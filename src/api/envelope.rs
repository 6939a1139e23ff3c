//! The `{ success, data, message }` response envelope.
//!
//! Every backend reply is decoded here into an [`ApiOutcome`], so the rest
//! of the crate never looks at the raw success flag.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw response envelope as served by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Decoded result of a backend call that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    /// `success: true`, carrying the decoded payload.
    Success(T),
    /// `success: false` (or an error status), carrying the message to show.
    Failure(String),
}

impl<T> ApiOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    /// The payload, discarding any failure message.
    pub fn ok(self) -> Option<T> {
        match self {
            ApiOutcome::Success(data) => Some(data),
            ApiOutcome::Failure(_) => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            ApiOutcome::Success(_) => None,
            ApiOutcome::Failure(message) => Some(message),
        }
    }
}

/// Decode a response body into an outcome.
///
/// `fallback` is the message used when the server reports a failure without
/// one, or when the payload does not have the expected shape. An `Err` means
/// the body is not a JSON envelope at all.
pub fn decode<T: DeserializeOwned>(
    status: u16,
    body: &str,
    fallback: &str,
) -> Result<ApiOutcome<T>, String> {
    let is_success_status = (200..300).contains(&status);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) if is_success_status => return Err(format!("invalid JSON body: {}", e)),
        Err(_) => return Ok(ApiOutcome::Failure(format!("HTTP {}", status))),
    };

    let is_envelope = value
        .as_object()
        .map(|map| map.contains_key("success"))
        .unwrap_or(false);

    if !is_envelope {
        // FastAPI-style error bodies: {"detail": "..."}
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            return Ok(ApiOutcome::Failure(detail.to_string()));
        }
        if !is_success_status {
            return Ok(ApiOutcome::Failure(format!("HTTP {}", status)));
        }
        return Err("response is not a success/data envelope".to_string());
    }

    let envelope: ApiResponse<Value> =
        serde_json::from_value(value).map_err(|e| format!("malformed envelope: {}", e))?;

    if !envelope.success {
        let message = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Ok(ApiOutcome::Failure(message));
    }

    let payload = match envelope.data {
        Some(Value::Null) | None => empty_payload(),
        Some(data) => serde_json::from_value(data).ok(),
    };

    // A payload of the wrong shape fails only this call, not the connection.
    Ok(match payload {
        Some(data) => ApiOutcome::Success(data),
        None => ApiOutcome::Failure(fallback.to_string()),
    })
}

/// The empty value of `T` for a success reply that carries no data:
/// `()`, an empty list, an empty map or an all-default record.
fn empty_payload<T: DeserializeOwned>() -> Option<T> {
    [Value::Null, Value::Array(Vec::new()), Value::Object(Default::default())]
        .into_iter()
        .find_map(|empty| serde_json::from_value(empty).ok())
}
