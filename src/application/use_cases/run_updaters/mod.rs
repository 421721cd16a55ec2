use crate::adapters::outbound::config::FragmentConfigResolver;
use crate::adapters::outbound::console::SilentProgressReporter;
use crate::adapters::outbound::network::{build_http_client, HttpSettings};
use crate::application::factories::{UpdaterContext, UpdaterRegistry};
use crate::ports::outbound::{
    ConfigResolver, FetchOutcome, LockSource, ProgressReporter, PutOutcome, UpdateStore, Updater,
};
use crate::shared::error::{FatalError, Stage, UpdateError};
use crate::vulnerability_updates::domain::{
    AggregateError, RunOutcome, RunReport, RunResult, UpdaterName,
};
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Parallel updater cycles when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Collaborators shared (read-only) by every updater task of a run.
struct Collaborators {
    store: Arc<dyn UpdateStore>,
    locks: Arc<dyn LockSource>,
    registry: Arc<UpdaterRegistry>,
    resolver: Arc<dyn ConfigResolver>,
    http: reqwest::Client,
    base_dir: PathBuf,
    progress: Arc<dyn ProgressReporter>,
}

/// UpdateManager - runs every enabled updater and aggregates the outcome
///
/// Each enabled updater goes through its own cycle
/// `Resolving → Locking → Fetching → Parsing → Storing → Unlocking` on a
/// separate tokio task. A failing cycle only produces a failed
/// [`RunResult`]; every other updater still runs and still stores its data.
pub struct UpdateManager {
    shared: Arc<Collaborators>,
    enabled: Vec<UpdaterName>,
    concurrency: usize,
}

impl UpdateManager {
    pub fn builder() -> UpdateManagerBuilder {
        UpdateManagerBuilder::default()
    }

    /// Enabled updater names, de-duplicated and in visiting order.
    pub fn enabled(&self) -> &[UpdaterName] {
        &self.enabled
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn store(&self) -> &Arc<dyn UpdateStore> {
        &self.shared.store
    }

    /// Runs every enabled updater once.
    ///
    /// Returns only after every updater reached a terminal state. Cancelling
    /// `cancel` makes in-flight cycles fail with `UpdateError::Cancelled`
    /// after releasing their locks.
    ///
    /// # Errors
    /// An [`AggregateError`] listing every failed updater when at least one
    /// failed. Successful updaters' data is in the store either way.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport, AggregateError> {
        let total = self.enabled.len();
        let finished = Arc::new(AtomicUsize::new(0));

        tracing::info!(
            updaters = total,
            concurrency = self.concurrency,
            "starting update run"
        );

        let results: Vec<RunResult> = stream::iter(self.enabled.iter().cloned())
            .map(|name| {
                let shared = Arc::clone(&self.shared);
                let cancel = cancel.clone();
                let finished = Arc::clone(&finished);
                async move {
                    let started = Instant::now();
                    let task = tokio::spawn(run_cycle(Arc::clone(&shared), name.clone(), cancel));
                    let result = match task.await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(updater = %name, error = %e, "updater task aborted");
                            RunResult::new(
                                name,
                                RunOutcome::Failed(UpdateError::permanent(format!(
                                    "updater task aborted: {}",
                                    e
                                ))),
                                started.elapsed(),
                            )
                        }
                    };
                    let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    shared
                        .progress
                        .report_progress(done, total, Some(result.name().as_str()));
                    result
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let report = RunReport::new(results);
        tracing::info!(
            succeeded = report.successes().count(),
            failed = report.results().len() - report.successes().count(),
            operations = report.total_operations(),
            "update run finished"
        );
        report.into_result()
    }
}

async fn run_cycle(
    shared: Arc<Collaborators>,
    name: UpdaterName,
    cancel: CancellationToken,
) -> RunResult {
    let started = Instant::now();
    let outcome = match execute_cycle(&shared, &name, &cancel).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::warn!(
                updater = %name,
                category = %error.category(),
                retryable = error.is_retryable(),
                error = %error,
                "updater failed"
            );
            RunOutcome::Failed(error)
        }
    };
    RunResult::new(name, outcome, started.elapsed())
}

async fn execute_cycle(
    shared: &Collaborators,
    name: &UpdaterName,
    cancel: &CancellationToken,
) -> Result<RunOutcome, UpdateError> {
    ensure_active(cancel, Stage::Resolving)?;
    let decoder = shared.resolver.resolve(name);
    let updater = shared.registry.create(&UpdaterContext {
        name,
        config: &decoder,
        http: &shared.http,
        base_dir: &shared.base_dir,
    })?;
    tracing::debug!(updater = %name, configured = decoder.has_fragment(), "updater resolved");

    // The guard also releases on drop, covering panics and task aborts.
    let mut lock = shared.locks.acquire(name, cancel).await?;
    tracing::debug!(updater = %name, "lock acquired");

    let result = fetch_parse_store(shared, updater.as_ref(), name, cancel).await;

    lock.release();
    tracing::debug!(updater = %name, "lock released");
    result
}

async fn fetch_parse_store(
    shared: &Collaborators,
    updater: &dyn Updater,
    name: &UpdaterName,
    cancel: &CancellationToken,
) -> Result<RunOutcome, UpdateError> {
    ensure_active(cancel, Stage::Fetching)?;
    let prior = shared.store.latest_fingerprint(name);
    tracing::debug!(updater = %name, prior = %prior, "fetching");

    let fetched = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(UpdateError::Cancelled { stage: Stage::Fetching });
        }
        fetched = updater.fetch(&prior, cancel) => fetched?,
    };

    let raw = match fetched {
        FetchOutcome::NotModified => {
            tracing::info!(updater = %name, fingerprint = %prior, "upstream unchanged");
            return Ok(RunOutcome::Unchanged);
        }
        FetchOutcome::Modified(raw) => raw,
    };

    ensure_active(cancel, Stage::Parsing)?;
    let set = updater.parse(raw)?;
    let fingerprint = set.fingerprint().clone();
    tracing::debug!(updater = %name, operations = set.len(), "parsed");

    ensure_active(cancel, Stage::Storing)?;
    match shared.store.put(name, set)? {
        PutOutcome::Appended {
            revision,
            operations,
        } => {
            tracing::info!(
                updater = %name,
                operations,
                revision,
                fingerprint = %fingerprint,
                "update operations stored"
            );
            Ok(RunOutcome::Updated { operations })
        }
        PutOutcome::Unchanged => {
            tracing::info!(updater = %name, fingerprint = %fingerprint, "no new operations");
            Ok(RunOutcome::Unchanged)
        }
    }
}

fn ensure_active(cancel: &CancellationToken, stage: Stage) -> Result<(), UpdateError> {
    if cancel.is_cancelled() {
        Err(UpdateError::Cancelled { stage })
    } else {
        Ok(())
    }
}

/// Builder for [`UpdateManager`]. Store, lock source and registry are
/// required; everything else has a default.
#[derive(Default)]
pub struct UpdateManagerBuilder {
    store: Option<Arc<dyn UpdateStore>>,
    locks: Option<Arc<dyn LockSource>>,
    registry: Option<Arc<UpdaterRegistry>>,
    resolver: Option<Arc<dyn ConfigResolver>>,
    enabled: Option<Vec<UpdaterName>>,
    http: Option<reqwest::Client>,
    base_dir: Option<PathBuf>,
    concurrency: Option<usize>,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl UpdateManagerBuilder {
    pub fn store(mut self, store: Arc<dyn UpdateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn lock_source(mut self, locks: Arc<dyn LockSource>) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn registry(mut self, registry: UpdaterRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    pub fn config_resolver(mut self, resolver: Arc<dyn ConfigResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Enabled set. Without it every registered updater runs.
    pub fn enabled<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = UpdaterName>,
    {
        self.enabled = Some(names.into_iter().collect());
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn base_dir(mut self, dir: PathBuf) -> Self {
        self.base_dir = Some(dir);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn progress_reporter(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn build(self) -> Result<UpdateManager, FatalError> {
        let store = self.store.ok_or(FatalError::MissingStore)?;
        let locks = self.locks.ok_or(FatalError::MissingLockSource)?;
        let registry = self.registry.ok_or(FatalError::MissingRegistry)?;

        let concurrency = self.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(FatalError::InvalidConcurrency);
        }

        let http = match self.http {
            Some(client) => client,
            None => build_http_client(&HttpSettings::default()).map_err(|e| {
                FatalError::HttpClient {
                    reason: e.to_string(),
                }
            })?,
        };

        let enabled: BTreeSet<UpdaterName> = match self.enabled {
            Some(names) => names.into_iter().collect(),
            None => registry
                .names()
                .into_iter()
                .filter_map(|name| UpdaterName::new(name).ok())
                .collect(),
        };

        Ok(UpdateManager {
            shared: Arc::new(Collaborators {
                store,
                locks,
                registry,
                resolver: self
                    .resolver
                    .unwrap_or_else(|| Arc::new(FragmentConfigResolver::empty())),
                http,
                base_dir: self.base_dir.unwrap_or_else(|| PathBuf::from(".")),
                progress: self
                    .progress
                    .unwrap_or_else(|| Arc::new(SilentProgressReporter)),
            }),
            enabled: enabled.into_iter().collect(),
            concurrency,
        })
    }
}
