//! Decoder types and traits
//!
//! Typed model of a list endpoint response and of a structured remote error.

use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single page returned by a list endpoint
pub trait ListPage: DeserializeOwned + Send + 'static {
    /// Item type carried by the page
    type Item: Send + 'static;

    /// Cursor of the following page, absent on the last page
    fn next_page_token(&self) -> Option<&str>;

    /// Total number of items in the resource, when the endpoint reports it
    fn total_results(&self) -> Option<u64>;

    /// Consume the page, yielding its items in server order
    fn into_items(self) -> Vec<Self::Item>;
}

/// Paging metadata of a list response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Total number of items in the resource
    #[serde(default)]
    pub total_results: Option<u64>,
    /// Items per page the server used
    #[serde(default)]
    pub results_per_page: Option<u32>,
}

/// Generic list response (`kind`, `etag`, `nextPageToken`, `pageInfo`, `items`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<I = JsonValue> {
    /// Resource kind
    #[serde(default)]
    pub kind: Option<String>,
    /// Entity tag of the response
    #[serde(default)]
    pub etag: Option<String>,
    /// Cursor of the following page
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Cursor of the preceding page
    #[serde(default)]
    pub prev_page_token: Option<String>,
    /// Paging metadata
    #[serde(default)]
    pub page_info: Option<PageInfo>,
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub items: Vec<I>,
}

impl<I> ListPage for ListResponse<I>
where
    I: DeserializeOwned + Send + 'static,
{
    type Item = I;

    fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }

    fn total_results(&self) -> Option<u64> {
        self.page_info.and_then(|p| p.total_results)
    }

    fn into_items(self) -> Vec<I> {
        self.items
    }
}

/// One entry of a structured error's detail list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error domain (e.g. `youtube.quota`)
    #[serde(default)]
    pub domain: Option<String>,
    /// Machine-readable reason (e.g. `quotaExceeded`)
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

/// Structured error parsed from a non-success response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Status code reported in the body
    #[serde(default)]
    pub code: Option<u16>,
    /// Top-level message
    #[serde(default)]
    pub message: String,
    /// Detail entries
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

impl ApiError {
    /// Create an error with only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Reason of the first detail entry
    pub fn reason(&self) -> Option<&str> {
        self.errors.iter().find_map(|e| e.reason.as_deref())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} ({reason})", self.message),
            None => f.write_str(&self.message),
        }
    }
}
