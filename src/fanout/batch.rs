//! Server-side batch grouping
//!
//! Calls are packed into `multipart/mixed` batch requests of at most
//! [`MAX_BATCH_SIZE`] parts. A batch only holds calls whose credentials are
//! compatible; a call that fits no existing batch opens a new one.
//! Each part of a batch response is matched back to its call by Content-ID.
//!
//! # Wire format
//!
//! ```text
//! --batch_page_fanout
//! Content-Type: application/http
//! Content-ID: <item3>
//!
//! GET /youtube/v3/videos?id=a%2Cb&key=... HTTP/1.1
//!
//! --batch_page_fanout--
//! ```
//!
//! Response parts answer with `Content-ID: <response-item3>`.

use super::executor::refresh_credentials;
use super::types::{BatchRequest, CallError, CallOutcome, RemoteCall};
use crate::auth::{Credential, CredentialKey};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RawResponse, RequestConfig, ResponseMeta};
use futures::future::join_all;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Most calls one batch request may carry
pub const MAX_BATCH_SIZE: usize = 1000;

/// Boundary used for outgoing batch bodies
pub const BOUNDARY: &str = "batch_page_fanout";

// ============================================================================
// Batch Group
// ============================================================================

/// Calls sharing one batch request
#[derive(Debug)]
pub struct BatchGroup {
    key: CredentialKey,
    calls: Vec<(usize, Box<dyn RemoteCall>)>,
}

impl BatchGroup {
    /// Create an empty group for calls with credential `key`
    pub fn new(key: CredentialKey) -> Self {
        Self {
            key,
            calls: Vec::new(),
        }
    }

    /// Credential identity shared by the group's calls
    pub fn key(&self) -> &CredentialKey {
        &self.key
    }

    /// Number of calls in the group
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// True if the group holds no calls
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// True if the group has room left
    pub fn has_capacity(&self) -> bool {
        self.calls.len() < MAX_BATCH_SIZE
    }

    /// True if a call with credential `key` may join this group
    pub fn accepts(&self, key: &CredentialKey) -> bool {
        self.has_capacity() && self.key.is_compatible(key)
    }

    /// Add a call under submission index `index`
    pub fn push(&mut self, index: usize, call: Box<dyn RemoteCall>) -> Result<()> {
        if !self.has_capacity() {
            return Err(Error::batch(format!(
                "a batch holds at most {MAX_BATCH_SIZE} calls"
            )));
        }
        self.calls.push((index, call));
        Ok(())
    }
}

// ============================================================================
// Batch Executor
// ============================================================================

/// Fan-out executor that sends calls through a batch endpoint
pub struct BatchFanOut<T> {
    client: Arc<HttpClient>,
    batch_url: String,
    groups: Vec<BatchGroup>,
    queued: usize,
    requires_auth: bool,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for BatchFanOut<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFanOut")
            .field("batch_url", &self.batch_url)
            .field("groups", &self.groups.len())
            .field("queued", &self.queued)
            .finish_non_exhaustive()
    }
}

impl<T> BatchFanOut<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Create an executor posting batches to `batch_url` through `client`
    pub fn new(client: Arc<HttpClient>, batch_url: impl Into<String>) -> Self {
        Self {
            client,
            batch_url: batch_url.into(),
            groups: Vec::new(),
            queued: 0,
            requires_auth: true,
            _payload: PhantomData,
        }
    }

    /// Whether `execute` refreshes expired credentials first (default `true`)
    #[must_use]
    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Queue a call, returning its submission index
    ///
    /// The call joins the first batch with room whose credential is
    /// compatible, otherwise it starts a new batch.
    pub async fn queue(&mut self, call: impl RemoteCall + 'static) -> Result<usize> {
        let key = match call.credential() {
            Some(credential) => credential.key().await,
            None => CredentialKey::anonymous(),
        };

        let index = self.queued;
        match self.groups.iter_mut().find(|g| g.accepts(&key)) {
            Some(group) => group.push(index, Box::new(call))?,
            None => {
                let mut group = BatchGroup::new(key);
                group.push(index, Box::new(call))?;
                self.groups.push(group);
            }
        }
        self.queued += 1;
        Ok(index)
    }

    /// Number of queued calls
    pub fn len(&self) -> usize {
        self.queued
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// The batch groups planned so far
    pub fn groups(&self) -> &[BatchGroup] {
        &self.groups
    }

    /// Refresh every expired credential of the queued calls, once per target
    pub async fn refresh_all(&self, cancel: &CancellationToken) -> Result<usize> {
        let credentials: Vec<Arc<dyn Credential>> = self
            .groups
            .iter()
            .flat_map(|g| g.calls.iter().filter_map(|(_, c)| c.credential()))
            .collect();
        refresh_credentials(credentials, cancel).await
    }

    /// Send every batch concurrently
    ///
    /// Returns one outcome per queued call, ordered by index. If a batch
    /// request itself fails, every call in it carries that failure.
    pub async fn execute(self, cancel: &CancellationToken) -> Result<Vec<CallOutcome<T>>> {
        if self.requires_auth {
            self.refresh_all(cancel).await?;
        }

        if self.queued == 0 {
            return Ok(Vec::new());
        }

        debug!(
            "Executing {} calls in {} batch(es)",
            self.queued,
            self.groups.len()
        );

        let sends = self
            .groups
            .iter()
            .map(|group| self.send_group(group, cancel));
        let mut outcomes: Vec<CallOutcome<T>> =
            join_all(sends).await.into_iter().flatten().collect();
        outcomes.sort_by_key(|o| o.index);

        Ok(outcomes)
    }

    async fn send_group(&self, group: &BatchGroup, cancel: &CancellationToken) -> Vec<CallOutcome<T>> {
        let mut outcomes = Vec::with_capacity(group.len());
        let mut parts = Vec::with_capacity(group.len());

        for (index, call) in &group.calls {
            match call.batch_request().await {
                Ok(request) => parts.push((*index, request)),
                Err(e) => outcomes.push(CallOutcome::failed(*index, CallError::from(e))),
            }
        }

        if parts.is_empty() {
            return outcomes;
        }

        let config = RequestConfig::new().raw_body(
            format!("multipart/mixed; boundary={BOUNDARY}"),
            encode_batch(&parts),
        );
        let response = self
            .client
            .send(Method::POST, &self.batch_url, config, cancel)
            .await;

        let batch_failure = match response {
            Ok(response) if response.is_success() => {
                match split_batch_response(&response) {
                    Ok(mut by_index) => {
                        for (index, _) in &parts {
                            let outcome = match by_index.remove(index) {
                                Some(part) => CallOutcome::from_response(*index, part),
                                None => CallOutcome::failed(
                                    *index,
                                    CallError::transport("missing from batch response"),
                                ),
                            };
                            outcomes.push(outcome);
                        }
                        return outcomes;
                    }
                    Err(e) => CallError::from(e),
                }
            }
            Ok(response) => CallError::status(
                response.status(),
                crate::decode::decode_error(response.status(), &response.body),
            ),
            Err(e) => CallError::from(e),
        };

        warn!("Batch of {} calls failed: {batch_failure}", parts.len());
        outcomes.extend(
            parts
                .iter()
                .map(|(index, _)| CallOutcome::failed(*index, batch_failure.clone())),
        );
        outcomes
    }
}

// ============================================================================
// Multipart Codec
// ============================================================================

/// Render batch parts as a `multipart/mixed` body using [`BOUNDARY`]
pub fn encode_batch(parts: &[(usize, BatchRequest)]) -> String {
    let mut body = String::new();
    for (index, request) in parts {
        let _ = write!(
            body,
            "--{BOUNDARY}\r\nContent-Type: application/http\r\nContent-ID: <item{index}>\r\n\r\n{} {} HTTP/1.1\r\n",
            request.method, request.path
        );
        for (key, value) in &request.headers {
            let _ = write!(body, "{key}: {value}\r\n");
        }
        body.push_str("\r\n");
    }
    let _ = write!(body, "--{BOUNDARY}--\r\n");
    body
}

/// One part of a batch response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPart {
    /// Submission index recovered from the part's Content-ID
    pub index: Option<usize>,
    /// The inner HTTP response
    pub response: RawResponse,
}

/// Boundary parameter of a `multipart/*` content type
pub fn boundary_of(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Parse a `multipart/mixed` batch response body
pub fn parse_batch(boundary: &str, body: &str) -> Result<Vec<BatchPart>> {
    let body = body.replace("\r\n", "\n");
    let delimiter = format!("--{boundary}");

    let mut parts = Vec::new();
    // First segment is the preamble
    for segment in body.split(delimiter.as_str()).skip(1) {
        if segment.starts_with("--") {
            break;
        }
        parts.push(parse_part(segment)?);
    }

    if parts.is_empty() {
        return Err(Error::batch("batch response has no parts"));
    }
    Ok(parts)
}

fn parse_part(segment: &str) -> Result<BatchPart> {
    let segment = segment.trim_start_matches('\n');
    let (part_headers, message) = segment
        .split_once("\n\n")
        .ok_or_else(|| Error::batch("batch part has no body"))?;

    let index = part_headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-id")
            .then(|| content_id_index(value.trim()))
            .flatten()
    });

    let (head, body) = message.split_once("\n\n").unwrap_or((message, ""));
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| Error::batch("batch part has no status line"))?;
    let headers = lines.filter_map(|line| {
        let (name, value) = line.split_once(':')?;
        Some((name.trim().to_string(), value.trim().to_string()))
    });

    Ok(BatchPart {
        index,
        response: RawResponse::new(
            ResponseMeta::new(status, headers),
            body.trim_end_matches('\n'),
        ),
    })
}

/// Index carried by `<item3>` or `<response-item3>`
fn content_id_index(value: &str) -> Option<usize> {
    let id = value.trim_start_matches('<').trim_end_matches('>');
    let id = id.strip_prefix("response-").unwrap_or(id);
    id.strip_prefix("item")?.parse().ok()
}

fn split_batch_response(response: &RawResponse) -> Result<HashMap<usize, RawResponse>> {
    let content_type = response.meta.header("content-type").unwrap_or_default();
    let boundary = boundary_of(content_type)
        .ok_or_else(|| Error::batch(format!("not a multipart response: '{content_type}'")))?;

    Ok(parse_batch(boundary, &response.body)?
        .into_iter()
        .filter_map(|part| Some((part.index?, part.response)))
        .collect())
}
