//! Authentication module
//!
//! Supports: API Key, Bearer, OAuth2 refresh token, OAuth2 client credentials
//!
//! The `Authenticator` applies auth to requests and implements the
//! [`Credential`] capability the fan-out executor uses to refresh expired
//! tokens once per target and to group compatible calls into batches.

mod authenticator;
mod credential;
mod types;

pub(crate) use credential::credential_id;
pub use authenticator::Authenticator;
pub use credential::Credential;
pub use types::{AuthConfig, CachedToken, CredentialKey, Location};
