//! Configuration types for list services
//!
//! A service is described in YAML: where the API lives, how to
//! authenticate, how the HTTP client behaves, and which list endpoints it
//! exposes.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::pagination::MAX_PAGE_SIZE;
use crate::types::{ParamMap, StringMap};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Service Config
// ============================================================================

/// Complete service configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL for API requests
    pub base_url: String,

    /// Server-side batch endpoint, if the API has one
    #[serde(default)]
    pub batch_url: Option<String>,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// List endpoint definitions
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl ServiceConfig {
    /// Parse and validate a config from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Check the config for mistakes serde cannot catch
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::config("base_url cannot be empty"));
        }
        Url::parse(&self.base_url)?;

        if let Some(batch_url) = &self.batch_url {
            if batch_url.is_empty() {
                return Err(Error::config("batch_url cannot be empty"));
            }
            Url::parse(batch_url)?;
        }

        let names: HashSet<_> = self.endpoints.iter().map(|e| &e.name).collect();
        if names.len() != self.endpoints.len() {
            return Err(Error::config("Duplicate endpoint names found"));
        }

        for endpoint in &self.endpoints {
            endpoint.validate()?;
        }

        Ok(())
    }

    /// Look up an endpoint by name
    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// HTTP client settings derived from this config
    pub fn client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.http.timeout_secs));

        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(rate_limit) = &self.http.rate_limit {
            builder = builder.rate_limit(rate_limit.clone());
        }
        for (key, value) in &self.http.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }

    /// Build an authenticated HTTP client for this service
    pub fn build_client(&self) -> Result<HttpClient> {
        HttpClient::with_auth(self.client_config(), self.auth.clone())
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Most page requests in flight at once; 0 means unbounded
    #[serde(default)]
    pub max_concurrency: usize,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: None,
            max_concurrency: 0,
            rate_limit: None,
            headers: StringMap::new(),
        }
    }
}

impl HttpConfig {
    /// Concurrency limit for fan-out, `None` when unbounded
    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrency > 0).then_some(self.max_concurrency)
    }
}

fn default_timeout() -> u64 {
    30
}

// ============================================================================
// Endpoint Config
// ============================================================================

/// A list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Endpoint name (e.g. "playlistItems")
    pub name: String,

    /// Path relative to the base URL
    pub path: String,

    /// Query parameter carrying the page cursor
    #[serde(default = "default_page_token_param")]
    pub page_token_param: String,

    /// Query parameter carrying the page size
    #[serde(default = "default_max_results_param")]
    pub max_results_param: String,

    /// Page size a request starts with; paged retrievals override it
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Static query parameters sent with every request
    #[serde(default)]
    pub params: ParamMap,

    /// Query parameters a caller may set per request (e.g. "id")
    #[serde(default)]
    pub fields: Vec<String>,
}

impl EndpointConfig {
    /// Create an endpoint with default cursor and size parameters
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            page_token_param: default_page_token_param(),
            max_results_param: default_max_results_param(),
            page_size: default_page_size(),
            params: ParamMap::new(),
            fields: Vec::new(),
        }
    }

    /// Add a static query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Declare a per-request field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// True if `name` is a per-request field of this endpoint
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("Endpoint name cannot be empty"));
        }
        if self.path.is_empty() {
            return Err(Error::config(format!(
                "Endpoint '{}' path cannot be empty",
                self.name
            )));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::config(format!(
                "Endpoint '{}' page_size must be between 1 and {MAX_PAGE_SIZE}",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_page_token_param() -> String {
    "pageToken".to_string()
}

fn default_max_results_param() -> String {
    "maxResults".to_string()
}

fn default_page_size() -> u32 {
    50
}
