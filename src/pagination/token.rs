//! Page token codec
//!
//! Converts between a zero-based item offset and the opaque cursor string
//! a list endpoint accepts as `pageToken`.
//!
//! # Format
//!
//! ```text
//! "C" + CHAR_16 + CHAR_1 [+ CHAR_128 [+ CHAR_65536]] + SUFFIX + DIRECTION
//! ```
//!
//! The offset is split over the mixed radixes `65536, 16384, 8192, 128, 16, 1`
//! and each digit is written as an alphabet symbol:
//!
//! | Char       | Digit(s)        | Symbol index                                   |
//! |------------|-----------------|------------------------------------------------|
//! | CHAR_1     | `d1`, `d8192`   | `d1 * 4 + offset`, offset 0..=3 (see below)    |
//! | CHAR_16    | `d16`           | `d16`, or `d16 + 8` once the offset is >= 128  |
//! | CHAR_128   | `d128`          | `d128`, present once the offset is >= 128      |
//! | CHAR_65536 | `d65536`        | `d65536`, present once the offset is >= 16384  |
//! | SUFFIX     | `d16384`        | `Q` below 128, `E` below 16384, else `d16384 * 16 + 1` |
//! | DIRECTION  | -               | `AA` for next-page tokens, `A_` for previous    |
//!
//! The CHAR_1 offset is `d8192` below 16384 and `2 + d8192` above it.
//! Tokens are 6, 7 or 8 characters long depending on magnitude.

use super::alphabet::{Alphabet, SYMBOLS};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Descending radixes of the offset decomposition
const RADIXES: [u32; 6] = [65536, 16384, 8192, 128, 16, 1];

const PREFIX: char = 'C';
const NEXT_TAG: &str = "AA";
const PREV_TAG: &str = "A_";

/// Shortest well-formed token: prefix, two payload chars, suffix, direction tag
pub const MIN_TOKEN_LEN: usize = 6;

/// Largest offset whose `d65536` digit still fits in one symbol
pub const MAX_INDEX: u32 = 64 * 65536 - 1;

/// Digits of an offset under [`RADIXES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Digits {
    pub d65536: u32,
    pub d16384: u32,
    pub d8192: u32,
    pub d128: u32,
    pub d16: u32,
    pub d1: u32,
}

impl Digits {
    /// Mixed-radix division of `index`
    pub fn decompose(index: u32) -> Self {
        let mut rest = index;
        let mut out = [0u32; 6];
        for (slot, radix) in out.iter_mut().zip(RADIXES) {
            *slot = rest / radix;
            rest %= radix;
        }
        Self {
            d65536: out[0],
            d16384: out[1],
            d8192: out[2],
            d128: out[3],
            d16: out[4],
            d1: out[5],
        }
    }

    /// Weighted sum of the digits
    pub fn compose(&self) -> u32 {
        [
            self.d65536,
            self.d16384,
            self.d8192,
            self.d128,
            self.d16,
            self.d1,
        ]
        .iter()
        .zip(RADIXES)
        .map(|(digit, radix)| digit * radix)
        .sum()
    }
}

/// A page token: an item offset plus its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageToken {
    index: u32,
    previous: bool,
}

impl PageToken {
    /// Create a token for `index`, clamping negative offsets to 0
    ///
    /// Fails with a range error above [`MAX_INDEX`].
    pub fn new(index: i64, previous: bool) -> Result<Self> {
        let clamped = index.max(0);
        if clamped > i64::from(MAX_INDEX) {
            return Err(Error::range(
                "index",
                index,
                format!("page tokens can address offsets up to {MAX_INDEX}"),
            ));
        }
        Ok(Self {
            index: clamped as u32,
            previous,
        })
    }

    /// Next-page token for `index`
    pub fn next(index: i64) -> Result<Self> {
        Self::new(index, false)
    }

    /// Previous-page token for `index`
    pub fn previous(index: i64) -> Result<Self> {
        Self::new(index, true)
    }

    /// Zero-based offset of the first item on the page
    pub fn index(&self) -> u32 {
        self.index
    }

    /// True for the previous-page variant
    pub fn is_previous(&self) -> bool {
        self.previous
    }

    /// Same offset, next-page variant
    #[must_use]
    pub fn as_next(self) -> Self {
        Self {
            previous: false,
            ..self
        }
    }

    /// Same offset, previous-page variant
    #[must_use]
    pub fn as_previous(self) -> Self {
        Self {
            previous: true,
            ..self
        }
    }

    /// Wire form of the token
    pub fn encode(&self) -> String {
        let index = self.index;
        let d = Digits::decompose(index);

        let offset1 = if index >= 16384 { 2 } else { 0 } + d.d8192;
        let offset16 = if index < 128 { 0 } else { 8 };

        let mut out = String::with_capacity(8);
        out.push(PREFIX);
        out.push(symbol(d.d16 + offset16));
        out.push(symbol(d.d1 * 4 + offset1));
        if index >= 128 {
            out.push(symbol(d.d128));
        }
        if index >= 16384 {
            out.push(symbol(d.d65536));
        }
        out.push(match index {
            0..=127 => 'Q',
            128..=16383 => 'E',
            _ => symbol((d.d16384 * 16 + 1) % 64),
        });
        out.push_str(if self.previous { PREV_TAG } else { NEXT_TAG });
        out
    }

    /// Parse the wire form of a token
    pub fn decode(token: &str) -> Result<Self> {
        if token.len() < MIN_TOKEN_LEN {
            return Err(Error::invalid_token(
                token,
                format!("token is shorter than {MIN_TOKEN_LEN} characters"),
            ));
        }
        if Alphabet::has_illegal_chars(token) {
            return Err(Error::invalid_token(
                token,
                "token contains characters outside the page token alphabet",
            ));
        }

        // All characters are single-byte table symbols past this point.
        let positions: Vec<u32> = token
            .chars()
            .filter_map(Alphabet::index_of)
            .map(|p| p as u32)
            .collect();

        let body = &positions[1..];
        let previous = body[body.len() - 1] != 0;
        let body = &body[..body.len() - 2];
        let suffix = body[body.len() - 1];
        let payload = &body[..body.len() - 1];

        let pos1 = payload[1];
        let mut digits = Digits {
            d1: pos1 / 4,
            d8192: u32::from(pos1 % 4 == 1 || pos1 % 4 == 3),
            d16: payload[0] % 8,
            ..Digits::default()
        };
        if let Some(&pos128) = payload.get(2) {
            digits.d128 = pos128;
        }
        if let Some(&pos65536) = payload.get(3) {
            digits.d16384 = suffix.saturating_sub(1) / 16;
            digits.d65536 = pos65536;
        }

        Ok(Self {
            index: digits.compose(),
            previous,
        })
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for PageToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Symbol for a digit value already known to be below 64
fn symbol(value: u32) -> char {
    SYMBOLS[(value % 64) as usize] as char
}

/// Next-page token string for `index`
pub fn encode(index: i64) -> Result<String> {
    PageToken::next(index).map(|t| t.encode())
}

/// Previous-page token string for `index`
pub fn encode_previous(index: i64) -> Result<String> {
    PageToken::previous(index).map(|t| t.encode())
}

/// Item offset carried by a token of either direction
pub fn decode(token: &str) -> Result<u32> {
    PageToken::decode(token).map(|t| t.index())
}
