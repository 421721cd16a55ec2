use crate::shared::Result;

/// OutputPresenter port for the exported snapshot's destination
/// (stdout, file, ...).
pub trait OutputPresenter {
    /// Writes the complete snapshot.
    ///
    /// # Errors
    /// Returns an error if the destination cannot be written, for example
    /// missing permissions, a refused symlink or a full disk.
    fn present(&self, content: &str) -> Result<()>;
}
