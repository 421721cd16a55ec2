use crate::shared::error::UpdateError;
use crate::vulnerability_updates::domain::UpdaterName;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// LockSource port issuing named, mutually exclusive locks.
///
/// At most one [`UpdaterLock`] per name is held at any instant. A local
/// implementation guards names inside this process; a distributed one would
/// coordinate through an external service behind the same contract.
#[async_trait]
pub trait LockSource: Send + Sync {
    /// Waits until `name` is free and returns its lock.
    ///
    /// # Errors
    /// Returns `UpdateError::Cancelled { stage: Stage::Locking }` if `cancel`
    /// fires while waiting, or `UpdateError::Lock` if the lock cannot be
    /// obtained at all.
    async fn acquire(
        &self,
        name: &UpdaterName,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn UpdaterLock>, UpdateError>;
}

/// A held lock. Implementations must release on drop so that every exit path
/// (early return, cancellation, panic) frees the name.
pub trait UpdaterLock: Send {
    fn name(&self) -> &UpdaterName;

    fn is_held(&self) -> bool;

    /// Extends the lease for implementations whose locks expire.
    fn renew(&mut self) -> Result<(), UpdateError> {
        if self.is_held() {
            Ok(())
        } else {
            Err(UpdateError::Lock {
                reason: format!("lock for '{}' is no longer held", self.name()),
            })
        }
    }

    /// Releases the lock. Calling it more than once is a no-op.
    fn release(&mut self);
}
