use super::osv_schema::parse_osv_feed;
use crate::ports::outbound::{FetchOutcome, RawContent, Updater};
use crate::shared::error::{Stage, UpdateError};
use crate::shared::security::MAX_FILE_SIZE;
use crate::vulnerability_updates::domain::{Fingerprint, UpdateOperationSet, UpdaterName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio_util::sync::CancellationToken;

/// Configuration fragment for the `local` updater.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalFeedConfig {
    /// Path to a JSON array of OSV records. Relative paths are resolved
    /// against the configuration file's directory.
    pub path: PathBuf,
    pub ecosystem: Option<String>,
}

/// LocalFeedUpdater adapter reading an OSV feed from disk.
///
/// The fingerprint is derived from the file's size and modification time,
/// so an untouched file is reported as not modified without being read.
pub struct LocalFeedUpdater {
    name: UpdaterName,
    path: PathBuf,
    ecosystem: Option<String>,
}

impl LocalFeedUpdater {
    pub fn new(
        name: UpdaterName,
        config: LocalFeedConfig,
        base_dir: &Path,
    ) -> Result<Self, UpdateError> {
        if config.path.as_os_str().is_empty() {
            return Err(UpdateError::config("`path` is required"));
        }
        let path = if config.path.is_absolute() {
            config.path
        } else {
            base_dir.join(config.path)
        };
        Ok(Self {
            name,
            path,
            ecosystem: config.ecosystem,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn file_fingerprint(&self) -> Result<Fingerprint, UpdateError> {
        let metadata = tokio::fs::symlink_metadata(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;

        if metadata.is_symlink() || !metadata.is_file() {
            return Err(UpdateError::permanent(format!(
                "{} is not a regular file",
                self.path.display()
            )));
        }
        if metadata.len() > MAX_FILE_SIZE {
            return Err(UpdateError::permanent(format!(
                "{} is too large ({} bytes)",
                self.path.display(),
                metadata.len()
            )));
        }

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| format!("{}.{:09}", d.as_secs(), d.subsec_nanos()))
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Fingerprint::new(format!(
            "file:{}:{}",
            metadata.len(),
            modified
        )))
    }
}

#[async_trait]
impl Updater for LocalFeedUpdater {
    fn name(&self) -> &UpdaterName {
        &self.name
    }

    async fn fetch(
        &self,
        prior: &Fingerprint,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, UpdateError> {
        let fingerprint = self.file_fingerprint().await?;
        if &fingerprint == prior {
            return Ok(FetchOutcome::NotModified);
        }

        if cancel.is_cancelled() {
            return Err(UpdateError::Cancelled {
                stage: Stage::Fetching,
            });
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        Ok(FetchOutcome::Modified(RawContent::new(bytes, fingerprint)))
    }

    fn parse(&self, raw: RawContent) -> Result<UpdateOperationSet, UpdateError> {
        let (bytes, fingerprint) = raw.into_parts();
        parse_osv_feed(&bytes, &self.name, fingerprint, self.ecosystem.as_deref())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> UpdateError {
    let reason = format!("{}: {}", path.display(), e);
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidInput => {
            UpdateError::permanent(reason)
        }
        _ => UpdateError::transient(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FEED: &str = r#"[{"id": "OSV-1", "affected": [{"package": {"name": "a", "ecosystem": "PyPI"}}]}]"#;

    fn updater(dir: &TempDir, path: &str) -> LocalFeedUpdater {
        LocalFeedUpdater::new(
            UpdaterName::new("local").unwrap(),
            LocalFeedConfig {
                path: PathBuf::from(path),
                ecosystem: None,
            },
            dir.path(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_requires_path() {
        let err = LocalFeedUpdater::new(
            UpdaterName::new("local").unwrap(),
            LocalFeedConfig::default(),
            Path::new("."),
        )
        .err()
        .unwrap();
        assert!(matches!(err, UpdateError::Config { .. }));
    }

    #[test]
    fn test_relative_path_resolved_against_base_dir() {
        let dir = TempDir::new().unwrap();
        let updater = updater(&dir, "feeds/feed.json");
        assert_eq!(updater.path(), dir.path().join("feeds/feed.json"));
    }

    #[tokio::test]
    async fn test_fetch_then_not_modified() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("feed.json"), FEED).unwrap();
        let updater = updater(&dir, "feed.json");
        let cancel = CancellationToken::new();

        let first = updater.fetch(&Fingerprint::empty(), &cancel).await.unwrap();
        let raw = match first {
            FetchOutcome::Modified(raw) => raw,
            FetchOutcome::NotModified => panic!("first fetch must return content"),
        };
        let fingerprint = raw.fingerprint().clone();
        assert!(fingerprint.as_str().starts_with("file:"));

        let set = updater.parse(raw).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.fingerprint(), &fingerprint);

        let second = updater.fetch(&fingerprint, &cancel).await.unwrap();
        assert_eq!(second, FetchOutcome::NotModified);
    }

    #[tokio::test]
    async fn test_missing_file_is_permanent_fetch_error() {
        let dir = TempDir::new().unwrap();
        let updater = updater(&dir, "missing.json");

        let err = updater
            .fetch(&Fingerprint::empty(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::Fetch { retryable: false, .. }));
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("feed.json")).unwrap();
        let updater = updater(&dir, "feed.json");

        let err = updater
            .fetch(&Fingerprint::empty(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[tokio::test]
    async fn test_malformed_content_fails_in_parse() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("feed.json"), "not json").unwrap();
        let updater = updater(&dir, "feed.json");

        let outcome = updater
            .fetch(&Fingerprint::empty(), &CancellationToken::new())
            .await
            .unwrap();
        let FetchOutcome::Modified(raw) = outcome else {
            panic!("expected content");
        };
        assert!(matches!(updater.parse(raw), Err(UpdateError::Parse { .. })));
    }
}
