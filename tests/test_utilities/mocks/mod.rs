/// Mock implementations for testing
mod mock_progress_reporter;
mod mock_updater;

pub use mock_progress_reporter::MockProgressReporter;
pub use mock_updater::{MockBehavior, MockUpdater};
