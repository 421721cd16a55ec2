use crate::ports::outbound::ProgressReporter;

/// ProgressReporter that discards everything. Used when the manager runs
/// without a console attached (library use, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn report(&self, _message: &str) {}

    fn report_progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}

    fn report_error(&self, _message: &str) {}

    fn report_completion(&self, _message: &str) {}
}
