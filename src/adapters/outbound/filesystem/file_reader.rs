use crate::shared::error::ExportError;
use crate::shared::security::validate_regular_file;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// FileSystemReader adapter for reading previously exported snapshots
///
/// Applies the same safety checks as every other file this tool reads:
/// no symlinks, regular files only, bounded size.
pub struct FileSystemReader;

impl FileSystemReader {
    pub fn new() -> Self {
        Self
    }

    /// Reads a snapshot file for `--resume`.
    pub fn read_snapshot(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ExportError::FileReadError {
                path: path.to_path_buf(),
                details: "Snapshot file does not exist".to_string(),
            }
            .into());
        }

        self.safe_read_file(path, "snapshot")
            .map_err(|e| {
                ExportError::FileReadError {
                    path: path.to_path_buf(),
                    details: e.to_string(),
                }
                .into()
            })
    }

    fn safe_read_file(&self, path: &Path, file_type: &str) -> Result<String> {
        validate_regular_file(path, file_type)?;
        fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file_type, e))
    }
}

impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}
