use crate::ports::outbound::{LockSource, UpdaterLock};
use crate::shared::error::{Stage, UpdateError};
use crate::vulnerability_updates::domain::UpdaterName;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

/// LocalLockSource adapter guarding updater names within this process.
///
/// Each name maps to its own async mutex; waiting for one name never blocks
/// another. Suitable for a single process only: two processes exporting from
/// the same configuration are not coordinated.
#[derive(Default)]
pub struct LocalLockSource {
    locks: DashMap<UpdaterName, Arc<Mutex<()>>>,
}

impl LocalLockSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutex_for(&self, name: &UpdaterName) -> Arc<Mutex<()>> {
        self.locks
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Whether `name` is currently held by someone.
    pub fn is_locked(&self, name: &UpdaterName) -> bool {
        let Some(mutex) = self.locks.get(name).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        let locked = mutex.try_lock().is_err();
        locked
    }
}

#[async_trait]
impl LockSource for LocalLockSource {
    async fn acquire(
        &self,
        name: &UpdaterName,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn UpdaterLock>, UpdateError> {
        if cancel.is_cancelled() {
            return Err(UpdateError::Cancelled {
                stage: Stage::Locking,
            });
        }

        let mutex = self.mutex_for(name);
        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(UpdateError::Cancelled { stage: Stage::Locking });
            }
            guard = mutex.lock_owned() => guard,
        };

        tracing::trace!(updater = %name, "lock acquired");
        Ok(Box::new(LocalLock {
            name: name.clone(),
            guard: Some(guard),
        }))
    }
}

struct LocalLock {
    name: UpdaterName,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UpdaterLock for LocalLock {
    fn name(&self) -> &UpdaterName {
        &self.name
    }

    fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    fn release(&mut self) {
        if self.guard.take().is_some() {
            tracing::trace!(updater = %self.name, "lock released");
        }
    }
}

impl Drop for LocalLock {
    fn drop(&mut self) {
        self.release();
    }
}
