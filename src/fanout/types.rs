//! Fan-out types
//!
//! A [`RemoteCall`] is anything the executor can send. Every queued call
//! yields exactly one [`CallOutcome`], tagged with its submission index.

use crate::auth::Credential;
use crate::decode::{decode_error, decode_payload, ApiError};
use crate::error::{Error, Result};
use crate::http::{RawResponse, ResponseMeta};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Remote Call
// ============================================================================

/// A single independently addressed remote call
#[async_trait]
pub trait RemoteCall: Send + Sync + fmt::Debug {
    /// Send the call and read its response
    ///
    /// Non-success statuses are responses, not errors.
    async fn send(&self, cancel: &CancellationToken) -> Result<RawResponse>;

    /// Credential the call is sent with, if any
    fn credential(&self) -> Option<Arc<dyn Credential>> {
        None
    }

    /// Render the call as one part of a server-side batch
    async fn batch_request(&self) -> Result<BatchRequest> {
        Err(Error::batch("call does not support server-side batching"))
    }
}

/// An inner request of a server-side batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// HTTP method
    pub method: Method,
    /// Path and query, relative to the API host
    pub path: String,
    /// Headers of the inner request
    pub headers: Vec<(String, String)>,
}

impl BatchRequest {
    /// Create a GET request for `path`
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

// ============================================================================
// Call Errors
// ============================================================================

/// What went wrong with a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallErrorKind {
    /// The request could not be sent or its response not read
    Transport,
    /// The remote side answered with a non-success status
    Status,
    /// A success body did not decode as the expected type
    Decode,
    /// The call was cancelled before it completed
    Cancelled,
}

impl fmt::Display for CallErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::Status => "status",
            Self::Decode => "decode",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Failure of one fanned-out call, delivered as data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct CallError {
    /// Failure category
    pub kind: CallErrorKind,
    /// HTTP status, for status errors
    pub status: Option<u16>,
    /// Human-readable description
    pub message: String,
    /// Structured error parsed from the response body
    pub api_error: Option<ApiError>,
}

impl CallError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: CallErrorKind::Transport,
            status: None,
            message: message.into(),
            api_error: None,
        }
    }

    /// Create a status error from a parsed error body
    pub fn status(status: u16, error: ApiError) -> Self {
        Self {
            kind: CallErrorKind::Status,
            status: Some(status),
            message: error.to_string(),
            api_error: Some(error),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: CallErrorKind::Decode,
            status: None,
            message: message.into(),
            api_error: None,
        }
    }

    /// Create a cancellation error
    pub fn cancelled() -> Self {
        Self {
            kind: CallErrorKind::Cancelled,
            status: None,
            message: "call cancelled".to_string(),
            api_error: None,
        }
    }

    /// True if the call was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.kind == CallErrorKind::Cancelled
    }
}

impl From<Error> for CallError {
    fn from(err: Error) -> Self {
        match err {
            Error::Cancelled => Self::cancelled(),
            Error::Api { status, error } => Self::status(status, error),
            Error::JsonParse(e) => Self::decode(e.to_string()),
            other => Self::transport(other.to_string()),
        }
    }
}

impl From<CallError> for Error {
    fn from(err: CallError) -> Self {
        match (err.kind, err.status, err.api_error) {
            (CallErrorKind::Cancelled, _, _) => Error::Cancelled,
            (CallErrorKind::Status, Some(status), Some(error)) => Error::api(status, error),
            _ => Error::Other(err.message),
        }
    }
}

// ============================================================================
// Call Outcome
// ============================================================================

/// Result of one queued call
#[derive(Debug, Clone)]
pub struct CallOutcome<T> {
    /// Submission index of the call (0-based, in queuing order)
    pub index: usize,
    /// Decoded payload or the call's failure
    pub result: std::result::Result<T, CallError>,
    /// Status and headers, when a response was received
    pub meta: Option<ResponseMeta>,
}

impl<T: DeserializeOwned> CallOutcome<T> {
    /// Build the outcome of a received response
    ///
    /// Success bodies decode as `T` with the `ETag` header back-filled;
    /// other statuses decode as a structured error.
    pub fn from_response(index: usize, response: RawResponse) -> Self {
        let status = response.status();
        let result = if response.is_success() {
            decode_payload(&response.body, response.meta.etag())
                .map_err(|e| CallError::decode(e.to_string()))
        } else {
            Err(CallError::status(status, decode_error(status, &response.body)))
        };

        Self {
            index,
            result,
            meta: Some(response.meta),
        }
    }
}

impl<T> CallOutcome<T> {
    /// Outcome of a call that produced no response
    pub fn failed(index: usize, error: CallError) -> Self {
        Self {
            index,
            result: Err(error),
            meta: None,
        }
    }

    /// True if the payload decoded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&CallError> {
        self.result.as_ref().err()
    }
}
