//! The 64-symbol code table used by page tokens.

use crate::error::{Error, Result};

/// Symbols in index order: `A-Z`, `a-z`, `0-9`, `-`, `_`
pub const SYMBOLS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Fixed ordered symbol table with lookup in both directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Alphabet;

impl Alphabet {
    /// Number of symbols in the table
    pub const LEN: usize = SYMBOLS.len();

    /// Position of `c` in the table, `None` when it is not a table symbol
    pub fn index_of(c: char) -> Option<usize> {
        if !c.is_ascii() {
            return None;
        }
        SYMBOLS.iter().position(|&s| s == c as u8)
    }

    /// Symbol at `index`
    ///
    /// Fails with a range error for indices outside `0..64`.
    pub fn char_at(index: usize) -> Result<char> {
        SYMBOLS
            .get(index)
            .map(|&b| b as char)
            .ok_or_else(|| Error::range("alphabet_index", index as i64, "must be between 0 and 63"))
    }

    /// True if any character of `s` is outside the table
    pub fn has_illegal_chars(s: &str) -> bool {
        s.chars().any(|c| Self::index_of(c).is_none())
    }
}
