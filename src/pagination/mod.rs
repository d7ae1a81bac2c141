//! Pagination module
//!
//! Page token codec and request ranges.
//!
//! # Overview
//!
//! List endpoints hand out opaque `pageToken` cursors one page at a time.
//! The cursors are a positional encoding of the item offset, so they can be
//! computed up front instead of discovered page by page. This module owns
//! that encoding ([`PageToken`]) and the windows of items that are turned
//! into sets of tokens ([`RequestRange`], [`PageTokenRange`]).

mod alphabet;
mod range;
mod token;

pub use alphabet::{Alphabet, SYMBOLS};
pub use range::{PageTokenRange, PageTokens, RequestRange, MAX_PAGE_SIZE};
pub use token::{decode, encode, encode_previous, Digits, PageToken, MAX_INDEX, MIN_TOKEN_LEN};

#[cfg(test)]
mod tests;
