/// Result alias used by application plumbing (CLI, config loading, presenters).
///
/// Per-updater work returns `Result<_, UpdateError>` instead so that failures
/// can be categorised and isolated.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
