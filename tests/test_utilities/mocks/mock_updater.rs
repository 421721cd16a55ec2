use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use updater_export::prelude::*;
use updater_export::vulnerability_updates::domain::{AffectedPackage, Severity, Vulnerability};

/// What a MockUpdater does when fetched
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Produces `operations` new operations under `fingerprint`, or
    /// not-modified when the prior fingerprint already equals it
    Returns {
        fingerprint: String,
        operations: usize,
    },
    /// Fails the fetch with the given error
    Fails(UpdateError),
    /// Waits before producing `Returns`-style data
    Slow {
        delay: Duration,
        fingerprint: String,
        operations: usize,
    },
}

/// Mock Updater that records every prior fingerprint it is given
///
/// Clones share their recordings, so a clone can be moved into a registry
/// factory while the test keeps the original for assertions.
#[derive(Clone)]
pub struct MockUpdater {
    name: UpdaterName,
    behavior: MockBehavior,
    priors: Arc<Mutex<Vec<Fingerprint>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockUpdater {
    pub fn new(name: &str, behavior: MockBehavior) -> Self {
        Self {
            name: UpdaterName::new(name).unwrap(),
            behavior,
            priors: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn returning(name: &str, fingerprint: &str, operations: usize) -> Self {
        Self::new(
            name,
            MockBehavior::Returns {
                fingerprint: fingerprint.to_string(),
                operations,
            },
        )
    }

    pub fn failing(name: &str, error: UpdateError) -> Self {
        Self::new(name, MockBehavior::Fails(error))
    }

    /// Registers a factory that hands out clones of this mock.
    pub fn register_in(&self, registry: &mut UpdaterRegistry) {
        let mock = self.clone();
        registry.register(self.name.as_str(), move |_ctx| {
            Ok(Box::new(mock.clone()) as Box<dyn Updater>)
        });
    }

    pub fn priors(&self) -> Vec<Fingerprint> {
        self.priors.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.priors.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn modified(&self, prior: &Fingerprint, fingerprint: &str, operations: usize) -> FetchOutcome {
        if prior.as_str() == fingerprint {
            return FetchOutcome::NotModified;
        }
        FetchOutcome::Modified(RawContent::new(
            operations.to_string().into_bytes(),
            Fingerprint::from(fingerprint),
        ))
    }
}

#[async_trait]
impl Updater for MockUpdater {
    fn name(&self) -> &UpdaterName {
        &self.name
    }

    async fn fetch(
        &self,
        prior: &Fingerprint,
        _cancel: &CancellationToken,
    ) -> std::result::Result<FetchOutcome, UpdateError> {
        self.priors.lock().unwrap().push(prior.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let outcome = match &self.behavior {
            MockBehavior::Returns {
                fingerprint,
                operations,
            } => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(self.modified(prior, fingerprint, *operations))
            }
            MockBehavior::Fails(error) => Err(error.clone()),
            MockBehavior::Slow {
                delay,
                fingerprint,
                operations,
            } => {
                tokio::time::sleep(*delay).await;
                Ok(self.modified(prior, fingerprint, *operations))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn parse(&self, raw: RawContent) -> std::result::Result<UpdateOperationSet, UpdateError> {
        let (bytes, fingerprint) = raw.into_parts();
        let count: usize = String::from_utf8_lossy(&bytes)
            .parse()
            .map_err(|e| UpdateError::parse(format!("{}", e)))?;
        let vulnerabilities = (1..=count)
            .map(|i| {
                let package =
                    AffectedPackage::new(format!("pkg-{}", i), "PyPI".to_string(), None, None)
                        .unwrap();
                Vulnerability::new(
                    format!("{}-{}", self.name, i),
                    Some(format!("vulnerability {} from {}", i, self.name)),
                    Severity::Medium,
                    package,
                )
                .unwrap()
            })
            .collect();
        Ok(UpdateOperationSet::new(
            self.name.clone(),
            fingerprint,
            vulnerabilities,
        ))
    }
}
