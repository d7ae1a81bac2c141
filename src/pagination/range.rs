//! Request ranges
//!
//! A [`RequestRange`] describes a window of items to fetch. A
//! [`PageTokenRange`] additionally knows the page token of every page in
//! that window, so the pages can be requested independently.

use super::token::{PageToken, MAX_INDEX};
use crate::error::{Error, Result};

/// Largest page size list endpoints accept
pub const MAX_PAGE_SIZE: u32 = 50;

/// A validated window of items: `number_of_items` items from `start_index`,
/// fetched `page_size` at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRange {
    start_index: u32,
    number_of_items: u32,
    page_size: u32,
}

impl RequestRange {
    /// Create a range with an explicit start and page size
    pub fn new(start_index: i64, number_of_items: i64, page_size: i64) -> Result<Self> {
        if !(0..=i64::from(u32::MAX)).contains(&start_index) {
            return Err(Error::range(
                "start_index",
                start_index,
                format!("must be between 0 and {}", u32::MAX),
            ));
        }
        if !(1..=i64::from(u32::MAX)).contains(&number_of_items) {
            return Err(Error::range(
                "number_of_items",
                number_of_items,
                format!("must be between 1 and {}", u32::MAX),
            ));
        }
        if !(1..=i64::from(MAX_PAGE_SIZE)).contains(&page_size) {
            return Err(Error::range(
                "page_size",
                page_size,
                format!("must be between 1 and {MAX_PAGE_SIZE} inclusive"),
            ));
        }

        Ok(Self {
            start_index: start_index as u32,
            number_of_items: number_of_items as u32,
            page_size: page_size as u32,
        })
    }

    /// Range of the first `number_of_items` items at the maximum page size
    pub fn first(number_of_items: i64) -> Result<Self> {
        Self::new(0, number_of_items, i64::from(MAX_PAGE_SIZE))
    }

    /// Offset of the first item
    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    /// Number of items requested
    pub fn number_of_items(&self) -> u32 {
        self.number_of_items
    }

    /// Items per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages covering the window
    pub fn page_count(&self) -> u32 {
        self.number_of_items.div_ceil(self.page_size)
    }

    /// Same start and page size, different item count
    pub fn with_number_of_items(&self, number_of_items: i64) -> Result<Self> {
        Self::new(
            i64::from(self.start_index),
            number_of_items,
            i64::from(self.page_size),
        )
    }
}

/// A [`RequestRange`] whose pages are all addressable by page token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTokenRange {
    range: RequestRange,
}

impl PageTokenRange {
    /// Create a range with an explicit start and page size
    ///
    /// Fails if any page would start beyond the largest encodable offset.
    pub fn new(start_index: i64, number_of_items: i64, page_size: i64) -> Result<Self> {
        RequestRange::new(start_index, number_of_items, page_size)?.try_into()
    }

    /// Range of the first `number_of_items` items at the maximum page size
    pub fn first(number_of_items: i64) -> Result<Self> {
        Self::new(0, number_of_items, i64::from(MAX_PAGE_SIZE))
    }

    /// The underlying window
    pub fn range(&self) -> &RequestRange {
        &self.range
    }

    /// Number of page tokens the range yields
    pub fn page_count(&self) -> u32 {
        self.range.page_count()
    }

    /// Offset of page `page` (0-based)
    pub fn page_start(&self, page: u32) -> u32 {
        self.range.start_index + page * self.range.page_size
    }

    /// Lazily yields one token per page in ascending offset order
    ///
    /// Each call starts a fresh pass over the pages.
    pub fn page_tokens(&self) -> PageTokens {
        PageTokens {
            range: *self,
            next: 0,
        }
    }

    /// Same start and page size, different item count
    pub fn with_number_of_items(&self, number_of_items: i64) -> Result<Self> {
        self.range.with_number_of_items(number_of_items)?.try_into()
    }
}

impl TryFrom<RequestRange> for PageTokenRange {
    type Error = Error;

    fn try_from(range: RequestRange) -> Result<Self> {
        let last_page_start = u64::from(range.start_index)
            + u64::from(range.page_count() - 1) * u64::from(range.page_size);
        if last_page_start > u64::from(MAX_INDEX) {
            return Err(Error::range(
                "number_of_items",
                i64::from(range.number_of_items),
                format!(
                    "last page would start at {last_page_start}, beyond the largest page token offset {MAX_INDEX}"
                ),
            ));
        }
        Ok(Self { range })
    }
}

impl From<PageTokenRange> for RequestRange {
    fn from(range: PageTokenRange) -> Self {
        range.range
    }
}

impl<'a> IntoIterator for &'a PageTokenRange {
    type Item = PageToken;
    type IntoIter = PageTokens;

    fn into_iter(self) -> PageTokens {
        self.page_tokens()
    }
}

/// Iterator over the page tokens of a [`PageTokenRange`]
#[derive(Debug, Clone)]
pub struct PageTokens {
    range: PageTokenRange,
    next: u32,
}

impl Iterator for PageTokens {
    type Item = PageToken;

    fn next(&mut self) -> Option<PageToken> {
        if self.next >= self.range.page_count() {
            return None;
        }
        let start = self.range.page_start(self.next);
        self.next += 1;
        // Every page start was checked against MAX_INDEX at construction.
        PageToken::next(i64::from(start)).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.range.page_count().saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for PageTokens {}
