use crate::shared::error::UpdateError;
use crate::vulnerability_updates::domain::{Fingerprint, UpdateOperationSet, UpdaterName};
use std::io::Write;

/// What `put` did with a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The set was appended as the new latest entry for its updater.
    Appended { revision: u64, operations: usize },
    /// The set was empty and carried the fingerprint already recorded, so
    /// nothing was appended.
    Unchanged,
}

/// UpdateStore port: append-only accumulator of update operation sets.
///
/// Concurrent `put` calls for different names must not interfere. The
/// manager's locking guarantees at most one `put` per name at a time.
pub trait UpdateStore: Send + Sync {
    /// Appends `set` under `name`, keeping every earlier set.
    fn put(&self, name: &UpdaterName, set: UpdateOperationSet) -> Result<PutOutcome, UpdateError>;

    /// Fingerprint of the latest recorded set, or the empty fingerprint.
    fn latest_fingerprint(&self, name: &UpdaterName) -> Fingerprint;

    /// Every recorded set for `name`, in recording order.
    fn history(&self, name: &UpdaterName) -> Vec<UpdateOperationSet>;

    /// Updater names with at least one recorded set, sorted.
    fn names(&self) -> Vec<UpdaterName>;

    /// Writes a complete, re-loadable snapshot of everything recorded.
    fn serialize(&self, out: &mut dyn Write) -> Result<(), UpdateError>;

    fn operation_count(&self, name: &UpdaterName) -> usize {
        self.history(name).iter().map(UpdateOperationSet::len).sum()
    }
}
