// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]

//! # page-fanout
//!
//! Concurrent retrieval of paginated list APIs that use opaque page tokens.
//!
//! Cursor-style APIs normally force clients to walk pages one after the
//! other, because each response names the next page. The tokens are
//! deterministic though: they encode an absolute item offset. This crate
//! computes the token of any page up front and fetches whole windows of
//! items at once.
//!
//! ## Features
//!
//! - **Page Token Codec**: encode and decode absolute item offsets
//! - **Page Ranges**: turn an item window into a list of page tokens
//! - **Fan-Out**: run many independent calls at once with per-call outcomes
//! - **Server-Side Batching**: pack up to 1000 calls into one multipart request
//! - **Credential Refresh**: refresh each distinct credential once per run
//! - **Retrieval Modes**: sequential, concurrent, concurrent with discovery
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use page_fanout::{JsonListService, ListCall, PageTokenRange, Result, ServiceConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ServiceConfig::from_file("youtube.yaml")?;
//!     let mut service = JsonListService::from_config(&config, "playlistItems")?;
//!     service.template_mut().set_field("playlistId", "PL...")?;
//!
//!     let range = PageTokenRange::new(0, 500, 50)?;
//!     let retrieved = service
//!         .fetch_concurrent_with_discovery(range, &CancellationToken::new())
//!         .await?;
//!
//!     println!("{} items, {} failed pages", retrieved.len(), retrieved.failures.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          ListService                            │
//! │  fetch_sequential   fetch_concurrent   fetch_..._with_discovery │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────┬────────────────┴─────┬──────────────┬────────────┐
//! │ Pagination  │       Fan-Out        │     HTTP     │   Decode   │
//! ├─────────────┼──────────────────────┼──────────────┼────────────┤
//! │ Token codec │ FanOut (join_all)    │ Rate limit   │ ListPage   │
//! │ Ranges      │ BatchFanOut (mime)   │ Auth         │ ETag       │
//! │             │ Credential refresh   │ Cancellation │ ApiError   │
//! └─────────────┴──────────────────────┴──────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication and credentials
pub mod auth;

/// HTTP client with rate limiting and cancellation
pub mod http;

/// Page token codec and page ranges
pub mod pagination;

/// Response decoders
pub mod decode;

/// Concurrent and batched call execution
pub mod fanout;

/// List requests
pub mod request;

/// Paged retrieval orchestration
pub mod engine;

/// Service configuration
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{EndpointConfig, ServiceConfig};
pub use decode::{ListPage, ListResponse};
pub use engine::{JsonListService, ListService, Retrieved, RetrievalConfig};
pub use fanout::{BatchFanOut, CallOutcome, FanOut, RemoteCall};
pub use pagination::{PageToken, PageTokenRange, RequestRange};
pub use request::{ListCall, ListRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
