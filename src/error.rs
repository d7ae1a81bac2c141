//! Error types for page-fanout
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Failures of individual fanned-out calls are not errors at this level;
//! they are delivered as [`CallError`](crate::fanout::CallError) data.

use crate::decode::ApiError;
use thiserror::Error;

/// The main error type for page-fanout
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Page Token Errors
    // ============================================================================
    #[error("Invalid page token '{token}': {reason}")]
    InvalidToken { token: String, reason: String },

    // ============================================================================
    // Range / Argument Errors
    // ============================================================================
    #[error("Invalid value {value} for '{parameter}': {message}")]
    Range {
        parameter: String,
        value: i64,
        message: String,
    },

    #[error("'{parameter}' is not a configurable field of endpoint '{endpoint}'")]
    ParameterNotFound { parameter: String, endpoint: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {error}")]
    Api { status: u16, error: ApiError },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Batch request failed: {message}")]
    Batch { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid token error
    pub fn invalid_token(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create a range error
    pub fn range(parameter: impl Into<String>, value: i64, message: impl Into<String>) -> Self {
        Self::Range {
            parameter: parameter.into(),
            value,
            message: message.into(),
        }
    }

    /// Create a parameter-not-found error
    pub fn parameter_not_found(parameter: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::ParameterNotFound {
            parameter: parameter.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a token refresh error
    pub fn token_refresh(message: impl Into<String>) -> Self {
        Self::TokenRefresh {
            message: message.into(),
        }
    }

    /// Create a batch error
    pub fn batch(message: impl Into<String>) -> Self {
        Self::Batch {
            message: message.into(),
        }
    }

    /// Create a remote status error
    pub fn api(status: u16, error: ApiError) -> Self {
        Self::Api { status, error }
    }

    /// True for errors caused by malformed local input rather than the remote side
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::InvalidToken { .. }
                | Error::Range { .. }
                | Error::ParameterNotFound { .. }
                | Error::Config { .. }
        )
    }
}

/// Result type alias for page-fanout
pub type Result<T> = std::result::Result<T, Error>;
