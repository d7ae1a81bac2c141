//! Auth configuration types
//!
//! These types describe how requests are authenticated and carry the
//! cached access token for flows that need refreshing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in query parameter
    #[default]
    Query,
    /// Place in HTTP header
    Header,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// API Key authentication (query or header)
    ApiKey {
        /// Where to place the API key
        #[serde(default)]
        location: Location,
        /// Header name (for header location)
        #[serde(default)]
        header_name: Option<String>,
        /// Query parameter name (for query location)
        #[serde(default)]
        query_param: Option<String>,
        /// The API key value
        value: String,
    },

    /// Bearer token authentication with a fixed token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 Refresh Token flow
    Oauth2Refresh {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Refresh token
        refresh_token: String,
    },

    /// OAuth2 Client Credentials flow
    Oauth2ClientCredentials {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Requested scopes
        #[serde(default)]
        scopes: Vec<String>,
    },
}

impl AuthConfig {
    /// Create an API key config placed in the `key` query parameter
    pub fn api_key(value: impl Into<String>) -> Self {
        Self::ApiKey {
            location: Location::Query,
            header_name: None,
            query_param: None,
            value: value.into(),
        }
    }

    /// Create a fixed bearer token config
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// True for flows whose access token expires and can be refreshed
    pub fn is_refreshable(&self) -> bool {
        matches!(
            self,
            Self::Oauth2Refresh { .. } | Self::Oauth2ClientCredentials { .. }
        )
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false, // No expiration = never expires
        }
    }
}

/// Identity of the authentication material a call is sent with
///
/// Two calls with equal keys may share one server-side batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    /// Current access token, if any
    pub access_token: Option<String>,
    /// API key, if any
    pub api_key: Option<String>,
}

impl CredentialKey {
    /// Key for unauthenticated calls
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Same access token and same API key
    pub fn is_compatible(&self, other: &Self) -> bool {
        self == other
    }
}
