use super::{Fingerprint, UpdaterName, Vulnerability};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One atomic unit of vulnerability data change, tagged with its producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOperation {
    sequence: u64,
    updater: UpdaterName,
    vulnerability: Vulnerability,
}

impl UpdateOperation {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn updater(&self) -> &UpdaterName {
        &self.updater
    }

    pub fn vulnerability(&self) -> &Vulnerability {
        &self.vulnerability
    }
}

/// The ordered operations produced by one fetch/parse cycle of one updater,
/// paired with the fingerprint that cycle observed.
///
/// `revision` is assigned by the store when the set is recorded; a freshly
/// parsed set carries revision 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOperationSet {
    updater: UpdaterName,
    fingerprint: Fingerprint,
    #[serde(rename = "ref")]
    reference: Uuid,
    date: DateTime<Utc>,
    revision: u64,
    operations: Vec<UpdateOperation>,
}

impl UpdateOperationSet {
    /// Builds a set from parsed vulnerabilities, numbering operations from 1
    /// in the order given.
    pub fn new(
        updater: UpdaterName,
        fingerprint: Fingerprint,
        vulnerabilities: Vec<Vulnerability>,
    ) -> Self {
        let operations = vulnerabilities
            .into_iter()
            .zip(1u64..)
            .map(|(vulnerability, sequence)| UpdateOperation {
                sequence,
                updater: updater.clone(),
                vulnerability,
            })
            .collect();

        Self {
            updater,
            fingerprint,
            reference: Uuid::new_v4(),
            date: Utc::now(),
            revision: 0,
            operations,
        }
    }

    /// Returns the set re-stamped with the store-assigned revision.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn updater(&self) -> &UpdaterName {
        &self.updater
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn reference(&self) -> Uuid {
        self.reference
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
