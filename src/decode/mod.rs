//! Response decoder module
//!
//! # Overview
//!
//! Success bodies decode into a [`ListPage`] (usually [`ListResponse`]);
//! non-success bodies decode into an [`ApiError`]. Decoding never looks at
//! field names by reflection: the page type declares its items, cursor and
//! total through the [`ListPage`] trait.

mod decoders;
mod types;

pub use decoders::{decode_error, decode_payload, ETAG_FIELD};
pub use types::{ApiError, ErrorDetail, ListPage, ListResponse, PageInfo};
