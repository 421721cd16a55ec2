pub mod fingerprint;
pub mod run_report;
pub mod update_operation;
pub mod updater_name;
pub mod vulnerability;

pub use fingerprint::Fingerprint;
pub use run_report::{AggregateError, RunOutcome, RunReport, RunResult, UpdaterFailure};
pub use update_operation::{UpdateOperation, UpdateOperationSet};
pub use updater_name::UpdaterName;
pub use vulnerability::{AffectedPackage, Severity, Vulnerability};
