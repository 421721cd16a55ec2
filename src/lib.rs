//! updater-export - run vulnerability updaters and export what they gathered
//!
//! This library runs a set of named updaters, each fetching vulnerability
//! data from one source, records the resulting update operations in an
//! append-only store and exports that store as a single snapshot. It follows
//! hexagonal architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`vulnerability_updates`): Value objects, run reports and severity policy
//! - **Application Layer** (`application`): Update manager, export use case and registries
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use updater_export::prelude::*;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<()> {
//! let manager = UpdateManager::builder()
//!     .store(Arc::new(JsonBlobStore::new()))
//!     .lock_source(Arc::new(LocalLockSource::new()))
//!     .registry(UpdaterRegistry::with_defaults())
//!     .build()?;
//!
//! let use_case = ExportUpdatersUseCase::new(manager, StderrProgressReporter::new());
//! let response = use_case
//!     .execute(ExportRequest::new(None, false), &CancellationToken::new())
//!     .await?;
//! println!("{} set(s) exported", response.sets_exported);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod logging;
pub mod ports;
pub mod shared;
pub mod vulnerability_updates;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::config::FragmentConfigResolver;
    pub use crate::adapters::outbound::console::{SilentProgressReporter, StderrProgressReporter};
    pub use crate::adapters::outbound::filesystem::{
        FileSystemReader, FileSystemWriter, StdoutPresenter,
    };
    pub use crate::adapters::outbound::locking::LocalLockSource;
    pub use crate::adapters::outbound::storage::JsonBlobStore;
    pub use crate::adapters::outbound::updaters::{LocalFeedUpdater, OsvFeedUpdater};
    pub use crate::application::dto::{ExportRequest, ExportResponse};
    pub use crate::application::factories::{UpdaterContext, UpdaterRegistry};
    pub use crate::application::use_cases::{ExportUpdatersUseCase, UpdateManager};
    pub use crate::ports::outbound::{
        ConfigDecoder, ConfigResolver, FetchOutcome, LockSource, OutputPresenter,
        ProgressReporter, PutOutcome, RawContent, UpdateStore, Updater, UpdaterLock,
    };
    pub use crate::shared::error::{ErrorCategory, ExitCode, FatalError, UpdateError};
    pub use crate::shared::Result;
    pub use crate::vulnerability_updates::domain::{
        AggregateError, Fingerprint, RunOutcome, RunReport, RunResult, UpdateOperation,
        UpdateOperationSet, UpdaterName,
    };
}
