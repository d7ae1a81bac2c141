//! Engine types
//!
//! Retrieval results, per-page failures, statistics and configuration for
//! the list service.

use crate::fanout::CallError;

/// Configuration for retrieval operations
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Most calls in flight during a fan-out (`None` = unbounded)
    pub max_concurrency: Option<usize>,
    /// Refresh expired credentials before each fan-out
    pub requires_auth: bool,
    /// Send fan-outs through this server-side batch endpoint
    pub batch_url: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            requires_auth: true,
            batch_url: None,
        }
    }
}

impl RetrievalConfig {
    /// Create a new retrieval config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit; `0` means unbounded
    #[must_use]
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = (limit > 0).then_some(limit);
        self
    }

    /// Set whether credentials are refreshed before fan-out
    #[must_use]
    pub fn with_requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Route fan-outs through a batch endpoint
    #[must_use]
    pub fn with_batch_url(mut self, batch_url: impl Into<String>) -> Self {
        self.batch_url = Some(batch_url.into());
        self
    }
}

/// A page (or id chunk) that could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// Position of the page within the retrieval, 0-based
    pub page: usize,
    /// Token the page was requested with, if any
    pub page_token: Option<String>,
    /// Why the page failed
    pub error: CallError,
}

/// Statistics from a retrieval
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalStats {
    /// Remote calls issued
    pub pages_requested: usize,
    /// Remote calls that failed
    pub pages_failed: usize,
    /// Items returned
    pub items_retrieved: usize,
    /// Total reported by the resource, when known
    pub total_results: Option<u64>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RetrievalStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add requested pages
    pub fn add_pages(&mut self, count: usize) {
        self.pages_requested += count;
    }

    /// Add a failed page
    pub fn add_failure(&mut self) {
        self.pages_failed += 1;
    }

    /// Add items
    pub fn add_items(&mut self, count: usize) {
        self.items_retrieved += count;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Items retrieved in logical order, plus whatever went missing
#[derive(Debug, Clone)]
pub struct Retrieved<I> {
    /// Items of every successful page, ordered by page
    pub items: Vec<I>,
    /// Pages excluded from `items` because their call failed
    pub failures: Vec<PageFailure>,
    /// Retrieval statistics
    pub stats: RetrievalStats,
}

impl<I> Default for Retrieved<I> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
            stats: RetrievalStats::default(),
        }
    }
}

impl<I> Retrieved<I> {
    /// True if no page failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no items were retrieved
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Discard failure details and keep the items
    pub fn into_items(self) -> Vec<I> {
        self.items
    }
}

impl<I> IntoIterator for Retrieved<I> {
    type Item = I;
    type IntoIter = std::vec::IntoIter<I>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
