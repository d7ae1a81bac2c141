//! Concurrent fan-out executor
//!
//! Calls are queued first, then executed together. Outcomes come back in
//! submission order whatever order the calls complete in, and one call's
//! failure never affects its siblings.

use super::types::{CallError, CallOutcome, RemoteCall};
use crate::auth::{credential_id, Credential};
use crate::error::{Error, Result};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Queue of independent remote calls decoded as `T`
pub struct FanOut<T> {
    calls: Vec<Box<dyn RemoteCall>>,
    requires_auth: bool,
    max_concurrency: Option<usize>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Default for FanOut<T> {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            requires_auth: true,
            max_concurrency: None,
            _payload: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for FanOut<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("queued", &self.calls.len())
            .field("requires_auth", &self.requires_auth)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

impl<T> FanOut<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Create an empty executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `execute` refreshes expired credentials first (default `true`)
    #[must_use]
    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Cap the number of calls in flight; `None` or `0` means unbounded
    #[must_use]
    pub fn max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.filter(|&n| n > 0);
        self
    }

    /// Queue a call, returning its submission index
    pub fn queue(&mut self, call: impl RemoteCall + 'static) -> usize {
        self.queue_boxed(Box::new(call))
    }

    /// Queue an already boxed call
    pub fn queue_boxed(&mut self, call: Box<dyn RemoteCall>) -> usize {
        let index = self.calls.len();
        self.calls.push(call);
        index
    }

    /// Number of queued calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Refresh every expired credential of the queued calls, once per target
    ///
    /// Returns the number of credentials refreshed.
    pub async fn refresh_all(&self, cancel: &CancellationToken) -> Result<usize> {
        refresh_credentials(self.calls.iter().filter_map(|c| c.credential()), cancel).await
    }

    /// Run every queued call concurrently
    ///
    /// A credential refresh failure aborts before any call is sent. After
    /// that, one outcome is returned per queued call, ordered by index.
    pub async fn execute(self, cancel: &CancellationToken) -> Result<Vec<CallOutcome<T>>> {
        if self.requires_auth {
            self.refresh_all(cancel).await?;
        }

        if self.calls.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Executing {} queued calls", self.calls.len());

        let pending = self
            .calls
            .iter()
            .enumerate()
            .map(|(index, call)| run_call::<T>(index, call.as_ref(), cancel));

        let outcomes: Vec<CallOutcome<T>> = match self.max_concurrency {
            Some(limit) => stream::iter(pending).buffered(limit).collect().await,
            None => join_all(pending).await,
        };

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            "Fan-out finished: {} calls, {} failed",
            outcomes.len(),
            failed
        );

        Ok(outcomes)
    }
}

/// Send one call and turn whatever happens into its outcome
pub(crate) async fn run_call<T: DeserializeOwned>(
    index: usize,
    call: &dyn RemoteCall,
    cancel: &CancellationToken,
) -> CallOutcome<T> {
    let sent = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        response = call.send(cancel) => response,
    };

    match sent {
        Ok(response) => CallOutcome::from_response(index, response),
        Err(e) => {
            debug!("Call {index} failed: {e}");
            CallOutcome::failed(index, CallError::from(e))
        }
    }
}

/// Refresh each distinct expired credential exactly once
///
/// Credentials are told apart by object identity. Ones that cannot
/// refresh are skipped.
pub(crate) async fn refresh_credentials(
    credentials: impl IntoIterator<Item = Arc<dyn Credential>>,
    cancel: &CancellationToken,
) -> Result<usize> {
    // Held for the whole pass so no identity is reused mid-loop
    let credentials: Vec<Arc<dyn Credential>> = credentials.into_iter().collect();
    let mut seen = HashSet::new();
    let mut refreshed = 0;

    for credential in &credentials {
        if !seen.insert(credential_id(credential)) {
            continue;
        }
        if !credential.supports_refresh() || !credential.is_expired().await {
            continue;
        }

        credential.refresh(cancel).await.map_err(|e| match e {
            Error::TokenRefresh { .. } | Error::Cancelled => e,
            other => Error::token_refresh(other.to_string()),
        })?;
        refreshed += 1;
    }

    if refreshed > 0 {
        info!("Refreshed {refreshed} credential(s) before fan-out");
    }
    Ok(refreshed)
}
