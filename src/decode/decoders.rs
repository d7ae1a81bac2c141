//! Response body decoding
//!
//! Turns raw response bodies into typed pages or structured errors.

use super::types::ApiError;
use crate::error::Result;
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Field the entity tag is stored under in a decoded payload
pub const ETAG_FIELD: &str = "etag";

/// Longest raw body kept as an error message
const MAX_RAW_MESSAGE_LEN: usize = 512;

/// Decode a success body as `T`
///
/// When the body is a JSON object without an `etag`, the entity tag from
/// the response headers is written into it first.
pub fn decode_payload<T: DeserializeOwned>(body: &str, etag: Option<&str>) -> Result<T> {
    let mut value: JsonValue = serde_json::from_str(body)?;

    if let (Some(tag), JsonValue::Object(map)) = (etag, &mut value) {
        let missing = map.get(ETAG_FIELD).map_or(true, JsonValue::is_null);
        if missing {
            map.insert(ETAG_FIELD.to_string(), JsonValue::String(tag.to_string()));
        }
    }

    Ok(serde_json::from_value(value)?)
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Structured(ApiError),
    Text(String),
}

/// Parse the body of a non-success response
///
/// Understands `{"error": {...}}` and `{"error": "..."}` bodies; anything
/// else becomes a message-only error carrying the (truncated) raw body.
pub fn decode_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Structured(mut error),
        }) => {
            error.code.get_or_insert(status);
            error
        }
        Ok(ErrorEnvelope {
            error: ErrorBody::Text(message),
        }) => ApiError {
            code: Some(status),
            message,
            errors: Vec::new(),
        },
        Err(_) => {
            let trimmed = body.trim();
            let message = if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.chars().take(MAX_RAW_MESSAGE_LEN).collect()
            };
            ApiError {
                code: Some(status),
                message,
                errors: Vec::new(),
            }
        }
    }
}
