use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use updater_export::adapters::outbound::config::FragmentConfigResolver;
use updater_export::adapters::outbound::console::StderrProgressReporter;
use updater_export::adapters::outbound::filesystem::FileSystemReader;
use updater_export::adapters::outbound::locking::LocalLockSource;
use updater_export::adapters::outbound::network::build_http_client;
use updater_export::adapters::outbound::storage::JsonBlobStore;
use updater_export::application::dto::ExportRequest;
use updater_export::application::factories::UpdaterRegistry;
use updater_export::application::use_cases::{
    ExportUpdatersUseCase, UpdateManager, DEFAULT_CONCURRENCY,
};
use updater_export::cli::Args;
use updater_export::config::{self, ConfigFile, CONFIG_FILENAME};
use updater_export::logging::{self, DEFAULT_LOG_LEVEL};
use updater_export::ports::outbound::ProgressReporter;
use updater_export::shared::error::{ExitCode, ExportError, FatalError};
use updater_export::shared::Result;

#[tokio::main]
async fn main() {
    // clap exits with status 2 on usage errors
    let args = Args::parse_args();

    match run(args).await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let (config, base_dir) = load_config(args.config.as_deref())?;

    let level = args
        .log_level
        .clone()
        .or_else(|| config.log_level().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    if !logging::is_known_level(&level) {
        return Err(ExportError::Validation {
            message: format!(
                "unknown log level '{}'; use trace, debug, info, warn or error",
                level
            ),
        }
        .into());
    }
    let format = match args.log_format {
        Some(format) => format,
        None => config.log_format()?.unwrap_or_default(),
    };
    logging::init_tracing(&level, format)?;

    let progress_reporter = Arc::new(StderrProgressReporter::new());
    let store = Arc::new(load_store(args.resume.as_deref(), progress_reporter.as_ref())?);

    let http = build_http_client(&config.http_settings()).map_err(|e| FatalError::HttpClient {
        reason: e.to_string(),
    })?;

    let concurrency = args
        .concurrency
        .map(|n| n as usize)
        .or(config.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);

    let mut builder = UpdateManager::builder()
        .store(store)
        .lock_source(Arc::new(LocalLockSource::new()))
        .registry(UpdaterRegistry::with_defaults())
        .config_resolver(Arc::new(FragmentConfigResolver::new(config.fragments())))
        .http_client(http)
        .base_dir(base_dir)
        .concurrency(concurrency)
        .progress_reporter(progress_reporter.clone());
    if let Some(names) = config.enabled_names()? {
        builder = builder.enabled(names);
    }
    let manager = builder.build()?;

    let cancel = CancellationToken::new();
    watch_ctrl_c(cancel.clone());
    if let Some(secs) = args.timeout {
        watch_deadline(cancel.clone(), Duration::from_secs(secs));
    }

    let use_case = ExportUpdatersUseCase::new(manager, progress_reporter);
    let response = use_case
        .execute(ExportRequest::new(args.output, args.strict), &cancel)
        .await?;

    if let Some(aggregate) = &response.aggregate_error {
        tracing::warn!(error = %aggregate, "run finished with failures");
    }
    Ok(response.exit_code)
}

/// Loads the explicit config file, or the default one in the current
/// directory. Returns the directory relative paths resolve against.
fn load_config(path: Option<&Path>) -> Result<(ConfigFile, PathBuf)> {
    if let Some(path) = path {
        let config = config::load_config_from_path(path)?;
        return Ok((config, parent_dir(path)));
    }

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    match config::discover_config(&cwd)? {
        Some(config) => Ok((config, cwd)),
        None => Err(ExportError::ConfigNotFound {
            path: cwd.join(CONFIG_FILENAME),
            suggestion: format!(
                "Create {} in the current directory or pass --config <PATH>",
                CONFIG_FILENAME
            ),
        }
        .into()),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn load_store(resume: Option<&Path>, progress: &dyn ProgressReporter) -> Result<JsonBlobStore> {
    let Some(path) = resume else {
        return Ok(JsonBlobStore::new());
    };

    let snapshot = FileSystemReader::new().read_snapshot(path)?;
    let store = JsonBlobStore::from_snapshot(&snapshot)
        .with_context(|| format!("Failed to load snapshot: {}", path.display()))?;
    progress.report(&format!(
        "📂 Resumed {} operation set(s) from {}",
        store.set_count(),
        path.display()
    ));
    Ok(store)
}

fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });
}

fn watch_deadline(cancel: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                tracing::warn!(secs = deadline.as_secs(), "run deadline reached, cancelling run");
                cancel.cancel();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("cfg.yml")), PathBuf::from("."));
        assert_eq!(
            parent_dir(Path::new("/etc/updater/cfg.yml")),
            PathBuf::from("/etc/updater")
        );
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.yml");
        fs::write(&path, "concurrency: 2\n").unwrap();

        let (config, base_dir) = load_config(Some(&path)).unwrap();
        assert_eq!(config.concurrency, Some(2));
        assert_eq!(base_dir, dir.path());
    }

    #[test]
    fn test_load_store_without_resume_is_empty() {
        let progress = StderrProgressReporter::new();
        let store = load_store(None, &progress).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_store_rejects_malformed_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prev.jsonl");
        fs::write(&path, "not json\n").unwrap();

        let progress = StderrProgressReporter::new();
        let err = load_store(Some(&path), &progress).unwrap_err();
        assert!(format!("{:#}", err).contains("snapshot line 1"));
    }
}
