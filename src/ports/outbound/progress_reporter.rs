/// ProgressReporter port for user-facing progress during a run.
///
/// Updater cycles run on parallel tasks, so implementations must be
/// `Send + Sync` and tolerate interleaved calls.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, message: &str);

    /// Reports `current` of `total` units done, with an optional message.
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    fn report_error(&self, message: &str);

    fn report_completion(&self, message: &str);
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for std::sync::Arc<T> {
    fn report(&self, message: &str) {
        (**self).report(message)
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        (**self).report_progress(current, total, message)
    }

    fn report_error(&self, message: &str) {
        (**self).report_error(message)
    }

    fn report_completion(&self, message: &str) {
        (**self).report_completion(message)
    }
}
