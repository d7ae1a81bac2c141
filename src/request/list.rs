//! Concrete list request over the HTTP client

use super::types::ListCall;
use crate::auth::Credential;
use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::fanout::{BatchRequest, RemoteCall};
use crate::http::{HttpClient, RawResponse, RequestConfig};
use crate::types::ParamMap;
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// GET request against one list endpoint
///
/// Cloning is cheap: the client and endpoint are shared, only the query
/// is copied.
#[derive(Debug, Clone)]
pub struct ListRequest {
    client: Arc<HttpClient>,
    endpoint: Arc<EndpointConfig>,
    query: ParamMap,
}

impl ListRequest {
    /// Create a request with the endpoint's static parameters and default page size
    pub fn new(client: Arc<HttpClient>, endpoint: EndpointConfig) -> Self {
        let mut query = endpoint.params.clone();
        query.insert(
            endpoint.max_results_param.clone(),
            endpoint.page_size.to_string(),
        );
        Self {
            client,
            endpoint: Arc::new(endpoint),
            query,
        }
    }

    /// Add a fixed query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// The endpoint this request targets
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Query parameters the request is sent with
    pub fn query(&self) -> &ParamMap {
        &self.query
    }

    /// Current page cursor
    pub fn page_token(&self) -> Option<&str> {
        self.query
            .get(&self.endpoint.page_token_param)
            .map(String::as_str)
    }

    /// Current page size
    pub fn max_results(&self) -> Option<u32> {
        self.query
            .get(&self.endpoint.max_results_param)
            .and_then(|v| v.parse().ok())
    }
}

#[async_trait]
impl RemoteCall for ListRequest {
    async fn send(&self, cancel: &CancellationToken) -> Result<RawResponse> {
        let config = RequestConfig {
            query: self.query.clone(),
            ..RequestConfig::default()
        };
        self.client
            .send(Method::GET, &self.endpoint.path, config, cancel)
            .await
    }

    fn credential(&self) -> Option<Arc<dyn Credential>> {
        self.client.credential()
    }

    async fn batch_request(&self) -> Result<BatchRequest> {
        let mut url = Url::parse(&self.client.build_url(&self.endpoint.path))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(&self.query);
            if let Some(auth) = self.client.authenticator() {
                pairs.extend_pairs(auth.query_pairs());
            }
        }

        let path = match url.query() {
            Some(query) if !query.is_empty() => format!("{}?{query}", url.path()),
            _ => url.path().to_string(),
        };

        let mut request = BatchRequest::get(path);
        if let Some(auth) = self.client.authenticator() {
            request.headers = auth.header_pairs().await?;
        }
        Ok(request)
    }
}

impl ListCall for ListRequest {
    fn endpoint_name(&self) -> &str {
        &self.endpoint.name
    }

    fn set_page_token(&mut self, token: Option<&str>) {
        let key = self.endpoint.page_token_param.clone();
        match token {
            Some(token) => {
                self.query.insert(key, token.to_string());
            }
            None => {
                self.query.remove(&key);
            }
        }
    }

    fn set_max_results(&mut self, max_results: u32) {
        self.query.insert(
            self.endpoint.max_results_param.clone(),
            max_results.to_string(),
        );
    }

    fn has_field(&self, field: &str) -> bool {
        self.endpoint.has_field(field)
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        if !self.has_field(field) {
            return Err(Error::parameter_not_found(field, &self.endpoint.name));
        }
        self.query.insert(field.to_string(), value.to_string());
        Ok(())
    }
}
