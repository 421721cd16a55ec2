use crate::ports::outbound::{PutOutcome, UpdateStore};
use crate::shared::error::UpdateError;
use crate::vulnerability_updates::domain::{Fingerprint, UpdateOperationSet, UpdaterName};
use dashmap::DashMap;
use std::io::{BufRead, Write};

/// JsonBlobStore adapter: in-memory, append-only store exported as
/// newline-delimited JSON.
///
/// Every recorded `UpdateOperationSet` becomes one line. Lines are grouped by
/// updater name (lexicographic) and kept in recording order within a name,
/// which is also the replay order used by [`JsonBlobStore::load`].
#[derive(Debug, Default)]
pub struct JsonBlobStore {
    sets: DashMap<UpdaterName, Vec<UpdateOperationSet>>,
}

impl JsonBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-creates a store from a snapshot previously written by `serialize`.
    ///
    /// Blank lines are skipped. Any other line that is not a valid set, or
    /// whose revision does not increase within its updater, is rejected with
    /// a `Store` error naming its 1-based line number.
    pub fn load<R: BufRead>(reader: R) -> Result<Self, UpdateError> {
        let store = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line.map_err(|e| {
                UpdateError::store(format!("snapshot line {}: {}", line_number, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let set: UpdateOperationSet = serde_json::from_str(&line).map_err(|e| {
                UpdateError::store(format!("snapshot line {}: {}", line_number, e))
            })?;
            if let Some(op) = set.operations().iter().find(|op| op.updater() != set.updater()) {
                return Err(UpdateError::store(format!(
                    "snapshot line {}: operation {} belongs to '{}' but the set belongs to '{}'",
                    line_number,
                    op.sequence(),
                    op.updater(),
                    set.updater()
                )));
            }

            let mut history = store.sets.entry(set.updater().clone()).or_default();
            if let Some(previous) = history.last() {
                if set.revision() <= previous.revision() {
                    return Err(UpdateError::store(format!(
                        "snapshot line {}: revision {} of '{}' does not follow revision {}",
                        line_number,
                        set.revision(),
                        set.updater(),
                        previous.revision()
                    )));
                }
            }
            history.push(set);
        }
        Ok(store)
    }

    pub fn from_snapshot(snapshot: &str) -> Result<Self, UpdateError> {
        Self::load(snapshot.as_bytes())
    }

    /// Total number of recorded sets across all updaters.
    pub fn set_count(&self) -> usize {
        self.sets.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.set_count() == 0
    }

    /// Renders the whole snapshot into memory.
    pub fn to_snapshot(&self) -> Result<String, UpdateError> {
        let mut buffer = Vec::new();
        self.serialize(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| UpdateError::store(e.to_string()))
    }
}

impl UpdateStore for JsonBlobStore {
    fn put(&self, name: &UpdaterName, set: UpdateOperationSet) -> Result<PutOutcome, UpdateError> {
        if set.updater() != name {
            return Err(UpdateError::store(format!(
                "set produced by '{}' cannot be recorded under '{}'",
                set.updater(),
                name
            )));
        }

        if set.is_empty() && *set.fingerprint() == self.latest_fingerprint(name) {
            return Ok(PutOutcome::Unchanged);
        }

        let mut history = self.sets.entry(name.clone()).or_default();
        let revision = history.last().map(|s| s.revision() + 1).unwrap_or(1);
        let operations = set.len();
        history.push(set.with_revision(revision));

        Ok(PutOutcome::Appended {
            revision,
            operations,
        })
    }

    fn latest_fingerprint(&self, name: &UpdaterName) -> Fingerprint {
        self.sets
            .get(name)
            .and_then(|history| history.last().map(|s| s.fingerprint().clone()))
            .unwrap_or_default()
    }

    fn history(&self, name: &UpdaterName) -> Vec<UpdateOperationSet> {
        self.sets
            .get(name)
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    fn names(&self) -> Vec<UpdaterName> {
        let mut names: Vec<UpdaterName> = self
            .sets
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    fn serialize(&self, out: &mut dyn Write) -> Result<(), UpdateError> {
        for name in self.names() {
            for set in self.history(&name) {
                serde_json::to_writer(&mut *out, &set)
                    .map_err(|e| UpdateError::store(format!("{}: {}", name, e)))?;
                out.write_all(b"\n")
                    .map_err(|e| UpdateError::store(format!("{}: {}", name, e)))?;
            }
        }
        out.flush().map_err(|e| UpdateError::store(e.to_string()))
    }
}
