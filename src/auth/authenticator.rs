//! Authenticator implementation
//!
//! Handles applying authentication to requests and managing token refresh.

use super::credential::Credential;
use super::types::{AuthConfig, CachedToken, CredentialKey, Location};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default query parameter for API keys
const DEFAULT_KEY_PARAM: &str = "key";

/// Default header for API keys
const DEFAULT_KEY_HEADER: &str = "X-Goog-Api-Key";

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached token for OAuth2 auth
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Create an authenticator with an already issued access token
    pub fn with_token(config: AuthConfig, token: CachedToken) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(Some(token))),
            http_client: Client::new(),
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::None => Ok(req),

            AuthConfig::ApiKey {
                location,
                header_name,
                query_param,
                value,
            } => match location {
                Location::Header => {
                    let header = header_name.as_deref().unwrap_or(DEFAULT_KEY_HEADER);
                    Ok(req.header(header, value))
                }
                Location::Query => {
                    let param = query_param.as_deref().unwrap_or(DEFAULT_KEY_PARAM);
                    Ok(req.query(&[(param, value)]))
                }
            },

            AuthConfig::Bearer { token } => Ok(req.bearer_auth(token)),

            AuthConfig::Oauth2Refresh { .. } | AuthConfig::Oauth2ClientCredentials { .. } => {
                let token = self.get_or_refresh_token().await?;
                Ok(req.bearer_auth(token))
            }
        }
    }

    /// Query parameters the auth contributes to a request URL
    ///
    /// Used when rendering the inner requests of a server-side batch.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match &self.config {
            AuthConfig::ApiKey {
                location: Location::Query,
                query_param,
                value,
                ..
            } => vec![(
                query_param
                    .clone()
                    .unwrap_or_else(|| DEFAULT_KEY_PARAM.to_string()),
                value.clone(),
            )],
            _ => Vec::new(),
        }
    }

    /// Headers the auth contributes to a request
    ///
    /// The batch counterpart of [`query_pairs`](Self::query_pairs).
    pub async fn header_pairs(&self) -> Result<Vec<(String, String)>> {
        let pairs = match &self.config {
            AuthConfig::ApiKey {
                location: Location::Header,
                header_name,
                value,
                ..
            } => vec![(
                header_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_KEY_HEADER.to_string()),
                value.clone(),
            )],
            AuthConfig::Bearer { token } => {
                vec![("Authorization".to_string(), format!("Bearer {token}"))]
            }
            AuthConfig::Oauth2Refresh { .. } | AuthConfig::Oauth2ClientCredentials { .. } => {
                let token = self.get_or_refresh_token().await?;
                vec![("Authorization".to_string(), format!("Bearer {token}"))]
            }
            _ => Vec::new(),
        };
        Ok(pairs)
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        // Need to refresh - acquire write lock
        let mut cached = self.cached_token.write().await;

        // Double-check after acquiring write lock (another task might have refreshed)
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Fetch a new token based on auth type
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        match &self.config {
            AuthConfig::Oauth2Refresh {
                token_url,
                client_id,
                client_secret,
                refresh_token,
            } => {
                let form = [
                    ("grant_type", "refresh_token"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ];
                self.request_token(token_url, &form).await
            }

            AuthConfig::Oauth2ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scopes,
            } => {
                let scope = scopes.join(" ");
                let mut form = vec![
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                ];
                if !scopes.is_empty() {
                    form.push(("scope", scope.as_str()));
                }
                self.request_token(token_url, &form).await
            }

            _ => Err(Error::token_refresh(
                "Token refresh not supported for this auth type",
            )),
        }
    }

    /// POST a token request form and cache-convert the response
    async fn request_token(&self, token_url: &str, form: &[(&str, &str)]) -> Result<CachedToken> {
        debug!("Requesting access token from {token_url}");

        let response = self
            .http_client
            .post(token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::token_refresh(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token_refresh(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::token_refresh(format!("Invalid token response: {e}")))?;
        Ok(token_response.into_cached_token())
    }

    /// Clear the cached token (useful for testing or forced refresh)
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Currently cached access token, if any
    pub async fn cached_token(&self) -> Option<CachedToken> {
        self.cached_token.read().await.clone()
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl Credential for Authenticator {
    async fn key(&self) -> CredentialKey {
        match &self.config {
            AuthConfig::None => CredentialKey::anonymous(),
            AuthConfig::ApiKey { value, .. } => CredentialKey {
                access_token: None,
                api_key: Some(value.clone()),
            },
            AuthConfig::Bearer { token } => CredentialKey {
                access_token: Some(token.clone()),
                api_key: None,
            },
            AuthConfig::Oauth2Refresh { .. } | AuthConfig::Oauth2ClientCredentials { .. } => {
                CredentialKey {
                    access_token: self.cached_token.read().await.as_ref().map(|t| t.token.clone()),
                    api_key: None,
                }
            }
        }
    }

    fn supports_refresh(&self) -> bool {
        self.config.is_refreshable()
    }

    async fn is_expired(&self) -> bool {
        if !self.supports_refresh() {
            return false;
        }
        self.cached_token
            .read()
            .await
            .as_ref()
            .map_or(true, CachedToken::is_expired)
    }

    async fn refresh(&self, cancel: &CancellationToken) -> Result<()> {
        if !self.supports_refresh() {
            return Ok(());
        }

        let mut cached = self.cached_token.write().await;
        let new_token = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            token = self.fetch_new_token() => token?,
        };
        info!("Refreshed access token");
        *cached = Some(new_token);
        Ok(())
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.config {
            AuthConfig::None => "none",
            AuthConfig::ApiKey { .. } => "api_key",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Oauth2Refresh { .. } => "oauth2_refresh",
            AuthConfig::Oauth2ClientCredentials { .. } => "oauth2_client_credentials",
        };
        f.debug_struct("Authenticator")
            .field("kind", &kind)
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}
