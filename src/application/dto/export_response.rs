use crate::shared::error::ExitCode;
use crate::vulnerability_updates::domain::{AggregateError, RunReport};

/// ExportResponse - Result of one run followed by an export
///
/// The snapshot has already been written when this is returned; the
/// response only tells the caller how the run went.
#[derive(Debug, Clone)]
pub struct ExportResponse {
    /// Per-updater results, sorted by updater name
    pub report: RunReport,
    /// Present when at least one updater failed
    pub aggregate_error: Option<AggregateError>,
    /// Exit code after applying the strict/non-strict policy
    pub exit_code: ExitCode,
    /// Number of operation sets in the exported snapshot
    pub sets_exported: usize,
}

impl ExportResponse {
    pub fn new(
        report: RunReport,
        aggregate_error: Option<AggregateError>,
        exit_code: ExitCode,
        sets_exported: usize,
    ) -> Self {
        Self {
            report,
            aggregate_error,
            exit_code,
            sets_exported,
        }
    }

    pub fn is_success(&self) -> bool {
        self.aggregate_error.is_none()
    }
}
