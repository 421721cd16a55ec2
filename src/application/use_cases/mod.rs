/// Use cases module containing application business logic orchestration
mod export_updaters;
mod run_updaters;

pub use export_updaters::ExportUpdatersUseCase;
pub use run_updaters::{UpdateManager, UpdateManagerBuilder, DEFAULT_CONCURRENCY};
