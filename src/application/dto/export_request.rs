use std::path::PathBuf;

/// ExportRequest - Internal request DTO for the export use case
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Snapshot destination; `None` writes to stdout
    pub output: Option<PathBuf>,
    /// Whether any updater failure should turn into a non-zero exit code
    pub strict: bool,
}

impl ExportRequest {
    pub fn new(output: Option<PathBuf>, strict: bool) -> Self {
        Self { output, strict }
    }
}
