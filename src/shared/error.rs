use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between a run where some
/// updaters failed (only reported in strict mode) and a run that could not
/// export anything at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - every updater succeeded, or failures were tolerated (non-strict)
    Success = 0,
    /// One or more updaters failed and strict mode was requested
    UpdatersFailed = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (configuration, manager construction, file I/O, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::UpdatersFailed => write!(f, "Updaters Failed (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Stage of a single updater cycle.
///
/// Stages always execute in declaration order:
/// `Resolving → Locking → Fetching → Parsing → Storing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolving,
    Locking,
    Fetching,
    Parsing,
    Storing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolving => write!(f, "resolving"),
            Stage::Locking => write!(f, "locking"),
            Stage::Fetching => write!(f, "fetching"),
            Stage::Parsing => write!(f, "parsing"),
            Stage::Storing => write!(f, "storing"),
        }
    }
}

/// Category used when aggregating per-updater failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Config,
    Lock,
    Fetch,
    Parse,
    Store,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Lock => write!(f, "lock"),
            ErrorCategory::Fetch => write!(f, "fetch"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Store => write!(f, "store"),
        }
    }
}

/// Error raised inside one updater's cycle.
///
/// These never escape the manager's run loop: each one is converted into a
/// failed `RunResult` for the updater that produced it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UpdateError {
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("no updater is registered under this name")]
    UnknownUpdater,

    #[error("lock acquisition failed: {reason}")]
    Lock { reason: String },

    #[error("cancelled while {stage}")]
    Cancelled { stage: Stage },

    #[error("fetch failed ({}): {reason}", if *.retryable { "transient" } else { "permanent" })]
    Fetch { reason: String, retryable: bool },

    #[error("malformed upstream payload: {reason}")]
    Parse { reason: String },

    #[error("failed to persist update operations: {reason}")]
    Store { reason: String },
}

impl UpdateError {
    pub fn config(reason: impl Into<String>) -> Self {
        UpdateError::Config {
            reason: reason.into(),
        }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        UpdateError::Fetch {
            reason: reason.into(),
            retryable: true,
        }
    }

    pub fn permanent(reason: impl Into<String>) -> Self {
        UpdateError::Fetch {
            reason: reason.into(),
            retryable: false,
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        UpdateError::Parse {
            reason: reason.into(),
        }
    }

    pub fn store(reason: impl Into<String>) -> Self {
        UpdateError::Store {
            reason: reason.into(),
        }
    }

    /// Category this error is reported under in the aggregate error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            UpdateError::Config { .. } | UpdateError::UnknownUpdater => ErrorCategory::Config,
            UpdateError::Lock { .. } => ErrorCategory::Lock,
            UpdateError::Cancelled {
                stage: Stage::Locking,
            } => ErrorCategory::Lock,
            UpdateError::Cancelled { .. } => ErrorCategory::Fetch,
            UpdateError::Fetch { .. } => ErrorCategory::Fetch,
            UpdateError::Parse { .. } => ErrorCategory::Parse,
            UpdateError::Store { .. } => ErrorCategory::Store,
        }
    }

    /// Whether a later run can reasonably expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpdateError::Fetch { retryable, .. } => *retryable,
            UpdateError::Lock { .. } | UpdateError::Cancelled { .. } => true,
            UpdateError::Config { .. }
            | UpdateError::UnknownUpdater
            | UpdateError::Parse { .. }
            | UpdateError::Store { .. } => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UpdateError::Cancelled { .. })
    }
}

/// Failure to assemble the manager. Nothing runs and nothing is exported.
#[derive(Debug, Error, PartialEq)]
pub enum FatalError {
    #[error("update manager requires a store")]
    MissingStore,

    #[error("update manager requires a lock source")]
    MissingLockSource,

    #[error("update manager requires an updater registry")]
    MissingRegistry,

    #[error("concurrency must be greater than zero")]
    InvalidConcurrency,

    #[error("failed to build HTTP client: {reason}")]
    HttpClient { reason: String },
}

/// Application-specific errors surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Configuration file not found: {path}\n\n💡 Hint: {suggestion}")]
    ConfigNotFound { path: PathBuf, suggestion: String },

    #[error("Failed to parse configuration file: {path}\nDetails: {details}\n\n💡 Hint: Ensure the file contains valid YAML syntax")]
    ConfigParseError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    /// Validation error for configuration values
    #[error("Validation error: {message}")]
    Validation { message: String },
}
