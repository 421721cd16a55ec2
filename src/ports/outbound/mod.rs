/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces the update manager uses to reach
/// configuration, locks, data sources, storage and the console.
pub mod config_resolver;
pub mod lock_source;
pub mod output_presenter;
pub mod progress_reporter;
pub mod update_store;
pub mod updater;

pub use config_resolver::{ConfigDecoder, ConfigResolver};
pub use lock_source::{LockSource, UpdaterLock};
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use update_store::{PutOutcome, UpdateStore};
pub use updater::{FetchOutcome, RawContent, Updater};
