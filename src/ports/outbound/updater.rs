use crate::shared::error::UpdateError;
use crate::vulnerability_updates::domain::{Fingerprint, UpdateOperationSet, UpdaterName};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Bytes fetched from upstream together with the fingerprint describing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent {
    bytes: Vec<u8>,
    fingerprint: Fingerprint,
}

impl RawContent {
    pub fn new(bytes: Vec<u8>, fingerprint: Fingerprint) -> Self {
        Self { bytes, fingerprint }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn into_parts(self) -> (Vec<u8>, Fingerprint) {
        (self.bytes, self.fingerprint)
    }
}

/// Result of a fetch relative to the prior fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Upstream is unchanged; the prior fingerprint still applies.
    NotModified,
    Modified(RawContent),
}

/// Updater port: one implementation per vulnerability data source.
///
/// The manager calls `fetch` and, if content changed, `parse`, while holding
/// the updater's lock. Both are called at most once per run.
#[async_trait]
pub trait Updater: Send + Sync {
    fn name(&self) -> &UpdaterName;

    /// Fetches upstream content newer than `prior`.
    ///
    /// Implementations should return promptly once `cancel` fires; the
    /// manager additionally drops the future on cancellation, which aborts
    /// any in-flight request.
    ///
    /// # Errors
    /// Transport failures are reported as `UpdateError::Fetch` with
    /// `retryable` telling transient failures apart from permanent ones.
    async fn fetch(
        &self,
        prior: &Fingerprint,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, UpdateError>;

    /// Turns fetched bytes into update operations.
    ///
    /// # Errors
    /// Malformed payloads are reported as `UpdateError::Parse`.
    fn parse(&self, raw: RawContent) -> Result<UpdateOperationSet, UpdateError>;
}
