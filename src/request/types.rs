//! Remote call template trait

use crate::error::Result;
use crate::fanout::RemoteCall;

/// A reusable list call with a variable cursor, page size and id fields
///
/// Everything else about the call is fixed when the template is built.
/// Setters only touch parameters the endpoint declares, so an unknown
/// field is reported instead of silently ignored.
pub trait ListCall: RemoteCall + Clone + 'static {
    /// Name of the endpoint, for errors and logs
    fn endpoint_name(&self) -> &str;

    /// Set or clear the page cursor
    fn set_page_token(&mut self, token: Option<&str>);

    /// Set the page size
    fn set_max_results(&mut self, max_results: u32);

    /// True if `field` may be set per request
    fn has_field(&self, field: &str) -> bool;

    /// Set a per-request field
    ///
    /// Fails with [`Error::ParameterNotFound`](crate::error::Error::ParameterNotFound)
    /// if the endpoint has no such field.
    fn set_field(&mut self, field: &str, value: &str) -> Result<()>;
}
