//! Paged retrieval engine
//!
//! # Overview
//!
//! [`ListService`] wraps one list call template and retrieves windows of
//! items from it:
//! - `fetch_sequential` / `fetch_all` - one page at a time, following
//!   `nextPageToken`
//! - `fetch_concurrent` - every page of a [`PageTokenRange`] at once,
//!   using precomputed page tokens
//! - `fetch_concurrent_with_discovery` - the first page alone to learn the
//!   resource's size, then the rest at once
//! - `fetch_by_ids` - one call per 50 ids
//!
//! Concurrent modes return items in page order whatever order the pages
//! complete in. Failed pages are left out of the items and listed in
//! [`Retrieved::failures`].

mod types;

pub use types::{PageFailure, Retrieved, RetrievalConfig, RetrievalStats};

use crate::config::ServiceConfig;
use crate::decode::{decode_error, decode_payload, ListPage, ListResponse};
use crate::error::{Error, Result};
use crate::fanout::{BatchFanOut, CallError, CallOutcome, FanOut, RemoteCall};
use crate::http::HttpClient;
use crate::pagination::{self, PageTokenRange, RequestRange, MAX_PAGE_SIZE};
use crate::request::{ListCall, ListRequest};
use crate::types::{JsonValue, RetrievalMode};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Ids sent per call by [`ListService::fetch_by_ids`]
pub const ID_CHUNK_SIZE: usize = 50;

/// Retrieval service over one list call template
///
/// `C` is the call template, `P` the page type its responses decode to.
pub struct ListService<C, P> {
    template: C,
    config: RetrievalConfig,
    batch_client: Option<Arc<HttpClient>>,
    _page: PhantomData<fn() -> P>,
}

impl<C: std::fmt::Debug, P> std::fmt::Debug for ListService<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListService")
            .field("template", &self.template)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<I> ListService<ListRequest, ListResponse<I>>
where
    I: serde::de::DeserializeOwned + Send + 'static,
{
    /// Build a service for the endpoint `endpoint` of a service config
    pub fn from_config(config: &ServiceConfig, endpoint: &str) -> Result<Self> {
        let endpoint = config
            .endpoint(endpoint)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown endpoint '{endpoint}'")))?;
        let client = Arc::new(config.build_client()?);

        let mut retrieval = RetrievalConfig::new();
        retrieval.max_concurrency = config.http.concurrency_limit();

        let mut service = Self::new(ListRequest::new(Arc::clone(&client), endpoint));
        if let Some(batch_url) = &config.batch_url {
            retrieval = retrieval.with_batch_url(batch_url);
            service.batch_client = Some(client);
        }
        Ok(service.with_config(retrieval))
    }
}

impl<C, P> ListService<C, P>
where
    C: ListCall,
    P: ListPage,
{
    /// Create a service over `template`
    pub fn new(template: C) -> Self {
        Self {
            template,
            config: RetrievalConfig::default(),
            batch_client: None,
            _page: PhantomData,
        }
    }

    /// Set retrieval configuration
    #[must_use]
    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Send fan-outs through a server-side batch endpoint using `client`
    #[must_use]
    pub fn with_batch(mut self, client: Arc<HttpClient>, batch_url: impl Into<String>) -> Self {
        self.config.batch_url = Some(batch_url.into());
        self.batch_client = Some(client);
        self
    }

    /// The call template
    pub fn template(&self) -> &C {
        &self.template
    }

    /// Mutable access to the call template
    pub fn template_mut(&mut self) -> &mut C {
        &mut self.template
    }

    /// Retrieval configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve `range` using `mode`
    pub async fn fetch(
        &self,
        range: PageTokenRange,
        mode: RetrievalMode,
        cancel: &CancellationToken,
    ) -> Result<Retrieved<P::Item>> {
        match mode {
            RetrievalMode::Sequential => self.fetch_sequential(range.into(), cancel).await,
            RetrievalMode::Concurrent => self.fetch_concurrent(range, cancel).await,
            RetrievalMode::ConcurrentWithDiscovery => {
                self.fetch_concurrent_with_discovery(range, cancel).await
            }
        }
    }

    /// Retrieve `range` one page at a time
    ///
    /// Starts at the token of `range.start_index()` and follows each page's
    /// next token until there is none or enough items have arrived. The
    /// first failing page aborts the retrieval.
    pub async fn fetch_sequential(
        &self,
        range: RequestRange,
        cancel: &CancellationToken,
    ) -> Result<Retrieved<P::Item>> {
        let start = Instant::now();
        let mut retrieved = Retrieved::default();
        let wanted = range.number_of_items() as usize;

        let mut call = self.template.clone();
        call.set_max_results(range.page_size());
        let mut next_token = Some(pagination::encode(i64::from(range.start_index()))?);

        while let Some(token) = next_token.take() {
            if retrieved.items.len() >= wanted {
                break;
            }

            call.set_page_token(Some(&token));
            let page = self.fetch_page(&call, cancel).await?;
            retrieved.stats.add_pages(1);
            if retrieved.stats.total_results.is_none() {
                retrieved.stats.total_results = page.total_results();
            }

            next_token = page.next_page_token().map(str::to_string);
            retrieved.items.extend(page.into_items());
            debug!(
                "{}: page {} done, {} items so far",
                call.endpoint_name(),
                retrieved.stats.pages_requested,
                retrieved.items.len()
            );
        }

        retrieved.stats.add_items(retrieved.items.len());
        retrieved.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "{}: retrieved {} items in {} sequential pages",
            self.template.endpoint_name(),
            retrieved.items.len(),
            retrieved.stats.pages_requested
        );
        Ok(retrieved)
    }

    /// Retrieve every item of the resource, one page at a time
    pub async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Retrieved<P::Item>> {
        let range = RequestRange::new(0, i64::from(u32::MAX), i64::from(MAX_PAGE_SIZE))?;
        self.fetch_sequential(range, cancel).await
    }

    /// Retrieve every page of `range` concurrently
    ///
    /// Pages past the end of the resource simply contribute no items.
    pub async fn fetch_concurrent(
        &self,
        range: PageTokenRange,
        cancel: &CancellationToken,
    ) -> Result<Retrieved<P::Item>> {
        let start = Instant::now();
        let mut retrieved = Retrieved::default();

        self.fan_out_pages(&range, 0, &mut retrieved, cancel).await?;

        retrieved.stats.add_items(retrieved.items.len());
        retrieved.stats.set_duration(start.elapsed().as_millis() as u64);
        self.log_finished("concurrent", &retrieved);
        Ok(retrieved)
    }

    /// Retrieve the first page of `range`, then the rest concurrently
    ///
    /// The first page reports the resource's total. When fewer items exist
    /// past the start than `range` asks for, the remaining pages are
    /// planned for the items that exist.
    ///
    /// The shrunk window counts from the start offset: it holds
    /// `total - start_index` items, not `total`.
    pub async fn fetch_concurrent_with_discovery(
        &self,
        range: PageTokenRange,
        cancel: &CancellationToken,
    ) -> Result<Retrieved<P::Item>> {
        let start = Instant::now();
        let mut retrieved = Retrieved::default();

        let first_token = range
            .page_tokens()
            .next()
            .ok_or_else(|| Error::Other("range has no pages".to_string()))?;
        let mut call = self.template.clone();
        call.set_max_results(range.range().page_size());
        call.set_page_token(Some(&first_token.encode()));

        let first = self.fetch_page(&call, cancel).await?;
        retrieved.stats.add_pages(1);
        let total = first.total_results();
        retrieved.stats.total_results = total;
        retrieved.items.extend(first.into_items());

        let plan = match total {
            Some(total) => {
                let available = total.saturating_sub(u64::from(range.range().start_index()));
                let requested = u64::from(range.range().number_of_items());
                if requested <= available {
                    Some(range)
                } else if available == 0 {
                    None
                } else {
                    info!(
                        "{}: resource holds {available} items past the start, not {requested}; planning {} pages",
                        self.template.endpoint_name(),
                        available.div_ceil(u64::from(range.range().page_size()))
                    );
                    Some(range.with_number_of_items(available as i64)?)
                }
            }
            None => Some(range),
        };

        if let Some(plan) = plan {
            self.fan_out_pages(&plan, 1, &mut retrieved, cancel).await?;
        }

        retrieved.stats.add_items(retrieved.items.len());
        retrieved.stats.set_duration(start.elapsed().as_millis() as u64);
        self.log_finished("discovery", &retrieved);
        Ok(retrieved)
    }

    /// Retrieve the resources named by `ids`, 50 ids per call
    ///
    /// Each call carries its chunk of ids comma-joined in `field`. Fails
    /// before any call is made if the template has no such field.
    pub async fn fetch_by_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
        field: &str,
        cancel: &CancellationToken,
    ) -> Result<Retrieved<P::Item>> {
        if !self.template.has_field(field) {
            return Err(Error::parameter_not_found(
                field,
                self.template.endpoint_name(),
            ));
        }

        let start = Instant::now();
        let mut calls = Vec::with_capacity(ids.len().div_ceil(ID_CHUNK_SIZE));
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let value = chunk
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(",");
            let mut call = self.template.clone();
            call.set_field(field, &value)?;
            calls.push((call, None));
        }

        let mut retrieved = Retrieved::default();
        self.run_calls(calls, 0, &mut retrieved, cancel).await?;

        retrieved.stats.add_items(retrieved.items.len());
        retrieved.stats.set_duration(start.elapsed().as_millis() as u64);
        self.log_finished("id-batched", &retrieved);
        Ok(retrieved)
    }

    /// Fan out every page of `range` after the first `skip`
    async fn fan_out_pages(
        &self,
        range: &PageTokenRange,
        skip: usize,
        retrieved: &mut Retrieved<P::Item>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let page_size = range.range().page_size();
        let calls: Vec<(C, Option<String>)> = range
            .page_tokens()
            .skip(skip)
            .map(|token| {
                let token = token.encode();
                let mut call = self.template.clone();
                call.set_max_results(page_size);
                call.set_page_token(Some(&token));
                (call, Some(token))
            })
            .collect();

        self.run_calls(calls, skip, retrieved, cancel).await
    }

    /// Execute `calls` together and merge their pages in call order
    async fn run_calls(
        &self,
        calls: Vec<(C, Option<String>)>,
        first_page: usize,
        retrieved: &mut Retrieved<P::Item>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if calls.is_empty() {
            return Ok(());
        }
        retrieved.stats.add_pages(calls.len());

        let (calls, tokens): (Vec<C>, Vec<Option<String>>) = calls.into_iter().unzip();
        let outcomes = self.execute(calls, cancel).await?;

        let cancelled = outcomes
            .iter()
            .any(|o| o.error().is_some_and(CallError::is_cancelled));
        if cancel.is_cancelled() && cancelled {
            return Err(Error::Cancelled);
        }

        for (outcome, token) in outcomes.into_iter().zip(tokens) {
            match outcome.result {
                Ok(page) => retrieved.items.extend(page.into_items()),
                Err(error) => {
                    let page = first_page + outcome.index;
                    warn!(
                        "{}: page {page} left out: {error}",
                        self.template.endpoint_name()
                    );
                    retrieved.stats.add_failure();
                    retrieved.failures.push(PageFailure {
                        page,
                        page_token: token,
                        error,
                    });
                }
            }
        }
        Ok(())
    }

    /// Run calls through the batch endpoint or a plain fan-out
    async fn execute(
        &self,
        calls: Vec<C>,
        cancel: &CancellationToken,
    ) -> Result<Vec<CallOutcome<P>>> {
        match (&self.batch_client, &self.config.batch_url) {
            (Some(client), Some(batch_url)) => {
                let mut batch = BatchFanOut::<P>::new(Arc::clone(client), batch_url.clone())
                    .requires_auth(self.config.requires_auth);
                for call in calls {
                    batch.queue(call).await?;
                }
                batch.execute(cancel).await
            }
            _ => {
                let mut fanout = FanOut::<P>::new()
                    .requires_auth(self.config.requires_auth)
                    .max_concurrency(self.config.max_concurrency);
                for call in calls {
                    fanout.queue(call);
                }
                fanout.execute(cancel).await
            }
        }
    }

    /// Fetch one page, turning any failure into an error
    async fn fetch_page(&self, call: &C, cancel: &CancellationToken) -> Result<P> {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = RemoteCall::send(call, cancel) => response?,
        };

        if !response.is_success() {
            let status = response.status();
            return Err(Error::api(status, decode_error(status, &response.body)));
        }
        decode_payload(&response.body, response.meta.etag())
    }

    fn log_finished(&self, mode: &str, retrieved: &Retrieved<P::Item>) {
        info!(
            "{}: retrieved {} items in {} {mode} pages ({} failed)",
            self.template.endpoint_name(),
            retrieved.items.len(),
            retrieved.stats.pages_requested,
            retrieved.stats.pages_failed
        );
    }
}

/// Service over generic JSON list responses
pub type JsonListService = ListService<ListRequest, ListResponse<JsonValue>>;
