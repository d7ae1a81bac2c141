//! HTTP request/response types
//!
//! A [`RawResponse`] is what every remote call produces at the transport
//! level: status, headers and the body text, before any decoding.

use crate::types::{ParamMap, StringMap};
use std::time::Duration;

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Pre-rendered body with its content type
    Raw {
        /// Value of the `Content-Type` header
        content_type: String,
        /// Body text
        data: String,
    },
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: ParamMap,
    /// Request headers
    pub headers: StringMap,
    /// Request body
    pub body: Option<RequestBody>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set a raw body
    #[must_use]
    pub fn raw_body(mut self, content_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw {
            content_type: content_type.into(),
            data: data.into(),
        });
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Transport metadata of a response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,
    /// Response headers, names lowercased
    pub headers: StringMap,
}

impl ResponseMeta {
    /// Create metadata from a status and header pairs
    pub fn new<K, V>(status: u16, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Entity tag header
    pub fn etag(&self) -> Option<&str> {
        self.header("etag")
    }
}

/// A response read to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// Status and headers
    pub meta: ResponseMeta,
    /// Body text
    pub body: String,
}

impl RawResponse {
    /// Create a response
    pub fn new(meta: ResponseMeta, body: impl Into<String>) -> Self {
        Self {
            meta,
            body: body.into(),
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.meta.status
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        self.meta.is_success()
    }
}
