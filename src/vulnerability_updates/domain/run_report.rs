use super::UpdaterName;
use crate::shared::error::{ErrorCategory, UpdateError};
use std::fmt;
use std::time::Duration;

/// Terminal state of one updater's cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// New data was recorded in the store.
    Updated { operations: usize },
    /// Upstream reported no change since the prior fingerprint.
    Unchanged,
    Failed(UpdateError),
}

/// Per-updater result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    name: UpdaterName,
    outcome: RunOutcome,
    elapsed: Duration,
}

impl RunResult {
    pub fn new(name: UpdaterName, outcome: RunOutcome, elapsed: Duration) -> Self {
        Self {
            name,
            outcome,
            elapsed,
        }
    }

    pub fn name(&self) -> &UpdaterName {
        &self.name
    }

    pub fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, RunOutcome::Failed(_))
    }

    /// Number of operations written to the store (0 for unchanged or failed).
    pub fn operations_written(&self) -> usize {
        match self.outcome {
            RunOutcome::Updated { operations } => operations,
            RunOutcome::Unchanged | RunOutcome::Failed(_) => 0,
        }
    }

    pub fn error(&self) -> Option<&UpdateError> {
        match &self.outcome {
            RunOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// One failing updater as listed by [`AggregateError`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterFailure {
    pub name: UpdaterName,
    pub category: ErrorCategory,
    pub error: UpdateError,
}

impl fmt::Display for UpdaterFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.name, self.category, self.error)
    }
}

/// Ordered accumulation of every updater's result for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    results: Vec<RunResult>,
}

impl RunReport {
    /// Results are kept sorted by updater name regardless of completion order.
    pub fn new(mut results: Vec<RunResult>) -> Self {
        results.sort_by(|a, b| a.name.cmp(&b.name));
        Self { results }
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn successes(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> Vec<UpdaterFailure> {
        self.results
            .iter()
            .filter_map(|r| {
                r.error().map(|error| UpdaterFailure {
                    name: r.name.clone(),
                    category: error.category(),
                    error: error.clone(),
                })
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.is_success())
    }

    pub fn total_operations(&self) -> usize {
        self.results.iter().map(RunResult::operations_written).sum()
    }

    /// `Ok` when every updater succeeded, otherwise an [`AggregateError`]
    /// listing each failure. The report travels with the error either way.
    pub fn into_result(self) -> Result<RunReport, AggregateError> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(AggregateError {
                failures,
                report: self,
            })
        }
    }
}

/// Combined error for a run where at least one updater failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateError {
    failures: Vec<UpdaterFailure>,
    report: RunReport,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} updaters failed: ",
            self.failures.len(),
            self.report.results().len()
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl AggregateError {
    pub fn failures(&self) -> &[UpdaterFailure] {
        &self.failures
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    pub fn mentions(&self, name: &str) -> bool {
        self.failures.iter().any(|f| f.name.as_str() == name)
    }
}
