//! Remote call templates
//!
//! A [`ListCall`] is the template the retrieval engine stamps out one call
//! per page (or per id chunk) from. [`ListRequest`] implements it for any
//! endpoint described by an [`EndpointConfig`](crate::config::EndpointConfig),
//! with per-request fields declared explicitly in the config.

mod list;
mod types;

pub use list::ListRequest;
pub use types::ListCall;
