use crate::ports::outbound::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::Mutex;

/// StderrProgressReporter adapter for reporting progress to stderr
///
/// Writes to stderr so it never mixes with a snapshot written to stdout.
/// Renders finished updaters on an indicatif bar and colors errors and the
/// completion summary when stderr is a terminal.
pub struct StderrProgressReporter {
    progress_bar: Mutex<Option<ProgressBar>>,
    colored: bool,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: Mutex::new(None),
            colored: std::io::stderr().is_terminal(),
        }
    }

    fn get_or_create_progress_bar(&self, total: usize) -> Option<ProgressBar> {
        let mut slot = self.progress_bar.lock().ok()?;
        if let Some(pb) = slot.as_ref() {
            return Some(pb.clone());
        }

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} updaters - {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        *slot = Some(pb.clone());
        Some(pb)
    }

    fn finish_progress_bar(&self) {
        if let Ok(mut slot) = self.progress_bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        match self.progress_bar.lock().ok().and_then(|slot| slot.clone()) {
            Some(pb) => pb.println(message),
            None => eprintln!("{}", message),
        }
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        if let Some(pb) = self.get_or_create_progress_bar(total) {
            pb.set_position(current as u64);
            if let Some(msg) = message {
                pb.set_message(msg.to_string());
            }
        }
    }

    fn report_error(&self, message: &str) {
        let line = if self.colored {
            message.red().to_string()
        } else {
            message.to_string()
        };
        match self.progress_bar.lock().ok().and_then(|slot| slot.clone()) {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    fn report_completion(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!();
        if self.colored {
            eprintln!("{}", message.green().bold());
        } else {
            eprintln!("{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reporter_lifecycle() {
        let reporter = StderrProgressReporter::new();
        reporter.report("🔄 Running 2 updaters...");
        reporter.report_progress(1, 2, Some("alpha"));
        reporter.report_error("⚠️  beta failed");
        reporter.report_progress(2, 2, Some("beta"));
        reporter.report_completion("✅ Done");
        assert!(reporter.progress_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_progress_bar_is_reused() {
        let reporter = StderrProgressReporter::default();
        reporter.report_progress(1, 3, None);
        reporter.report_progress(2, 3, None);
        let pb = reporter.progress_bar.lock().unwrap().clone().unwrap();
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(3));
    }

    #[test]
    fn test_reporter_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StderrProgressReporter>();
    }
}
