use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Upper bound for any file this tool reads (feeds, snapshots, config).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Rejects `path` if it is a symbolic link.
///
/// Uses `symlink_metadata()` so the link itself is inspected, not its target.
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. Symbolic links are not allowed for {} operations.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Checks that `path` exists, is not a symlink, is a regular file and is
/// within [`MAX_FILE_SIZE`].
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} ({}) is a symbolic link. Symbolic links are not allowed.",
            path.display(),
            file_description
        );
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    validate_file_size(metadata.len(), path, MAX_FILE_SIZE)
}

pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            file_size,
            max_size
        );
    }
    Ok(())
}
