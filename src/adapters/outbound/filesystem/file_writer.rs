use crate::ports::outbound::OutputPresenter;
use crate::shared::error::ExportError;
use crate::shared::security::validate_not_symlink;
use crate::shared::Result;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// FileSystemWriter adapter for writing the snapshot to a file
///
/// The snapshot is written to a temporary file next to the destination and
/// renamed over it, so readers never observe a partially written export.
pub struct FileSystemWriter {
    output_path: PathBuf,
}

impl FileSystemWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    fn parent_directory(&self) -> &Path {
        match self.output_path.parent() {
            Some(parent) if parent != Path::new("") => parent,
            _ => Path::new("."),
        }
    }

    fn validate_parent_directory(&self) -> Result<()> {
        let parent = self.parent_directory();
        if !parent.is_dir() {
            return Err(self.write_error(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }
        Ok(())
    }

    /// Refuses to replace a symlink at the destination.
    fn validate_output_security(&self) -> Result<()> {
        if self.output_path.symlink_metadata().is_ok() {
            validate_not_symlink(&self.output_path, "write")
                .map_err(|e| self.write_error(e.to_string()))?;
        }
        Ok(())
    }

    fn write_error(&self, details: String) -> anyhow::Error {
        ExportError::FileWriteError {
            path: self.output_path.clone(),
            details,
        }
        .into()
    }
}

impl OutputPresenter for FileSystemWriter {
    fn present(&self, content: &str) -> Result<()> {
        self.validate_parent_directory()?;
        self.validate_output_security()?;

        let mut temp = NamedTempFile::new_in(self.parent_directory())
            .map_err(|e| self.write_error(format!("Failed to create temporary file: {}", e)))?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| self.write_error(e.to_string()))?;
        temp.persist(&self.output_path)
            .map_err(|e| self.write_error(e.error.to_string()))?;

        tracing::debug!(path = %self.output_path.display(), bytes = content.len(), "snapshot written");
        eprintln!("✅ Snapshot written: {}", self.output_path.display());
        Ok(())
    }
}

/// StdoutPresenter adapter for writing the snapshot to stdout
pub struct StdoutPresenter;

impl StdoutPresenter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdoutPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPresenter for StdoutPresenter {
    fn present(&self, content: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| anyhow::anyhow!("Failed to write to stdout: {}", e))?;
        Ok(())
    }
}
