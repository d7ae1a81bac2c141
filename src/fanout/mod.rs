//! Fan-out / fan-in execution
//!
//! # Overview
//!
//! [`FanOut`] runs many independent [`RemoteCall`]s concurrently and
//! returns one [`CallOutcome`] per call, ordered by submission index.
//! [`BatchFanOut`] sends the same calls through a server-side batch
//! endpoint instead, grouping calls with compatible credentials.
//!
//! Before either executor sends anything it refreshes each distinct expired
//! credential once. A refresh failure is the only error `execute` returns;
//! everything that goes wrong with an individual call is carried in that
//! call's outcome.

mod batch;
mod executor;
mod types;

pub use batch::{
    boundary_of, encode_batch, parse_batch, BatchFanOut, BatchGroup, BatchPart, BOUNDARY,
    MAX_BATCH_SIZE,
};
pub use executor::FanOut;
pub use types::{BatchRequest, CallError, CallErrorKind, CallOutcome, RemoteCall};
