//! Credential capability seen by the fan-out executor.

use super::types::CredentialKey;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Authentication material attached to a call target
///
/// The executor refreshes expired credentials once per target before a
/// fan-out starts, and batches calls whose [`CredentialKey`]s match.
#[async_trait]
pub trait Credential: Send + Sync + fmt::Debug {
    /// Identity of the material requests are currently sent with
    async fn key(&self) -> CredentialKey;

    /// Whether [`refresh`](Credential::refresh) does anything
    ///
    /// Key-only and fixed-token auth return `false`.
    fn supports_refresh(&self) -> bool {
        false
    }

    /// True if the access token must be refreshed before use
    async fn is_expired(&self) -> bool {
        false
    }

    /// Obtain a new access token
    async fn refresh(&self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }
}

/// Address of the credential object, used to refresh each target once
pub(crate) fn credential_id(credential: &Arc<dyn Credential>) -> usize {
    Arc::as_ptr(credential).cast::<()>() as usize
}
