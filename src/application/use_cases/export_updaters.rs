use crate::application::dto::{ExportRequest, ExportResponse};
use crate::application::factories::{PresenterFactory, PresenterType};
use crate::application::use_cases::UpdateManager;
use crate::ports::outbound::ProgressReporter;
use crate::shared::error::ExitCode;
use crate::shared::Result;
use anyhow::Context;
use tokio_util::sync::CancellationToken;

/// ExportUpdatersUseCase - runs every enabled updater, then exports the store
///
/// The snapshot is exported whether or not some updaters failed; failed
/// updaters simply contribute no new data. Only the exit code depends on
/// the strict flag.
///
/// # Type Parameters
/// * `PR` - ProgressReporter implementation
pub struct ExportUpdatersUseCase<PR> {
    manager: UpdateManager,
    progress_reporter: PR,
}

impl<PR> ExportUpdatersUseCase<PR>
where
    PR: ProgressReporter,
{
    pub fn new(manager: UpdateManager, progress_reporter: PR) -> Self {
        Self {
            manager,
            progress_reporter,
        }
    }

    /// Runs the manager under `cancel` and writes the snapshot to the
    /// requested destination.
    ///
    /// # Errors
    /// Only when the snapshot cannot be rendered or written. Updater
    /// failures are reported in the response, never as an error.
    pub async fn execute(
        &self,
        request: ExportRequest,
        cancel: &CancellationToken,
    ) -> Result<ExportResponse> {
        self.progress_reporter.report(&format!(
            "🔄 Running {} updater(s) (concurrency {})...",
            self.manager.enabled().len(),
            self.manager.concurrency()
        ));

        let (report, aggregate_error) = match self.manager.run(cancel).await {
            Ok(report) => (report, None),
            Err(aggregate) => (aggregate.report().clone(), Some(aggregate)),
        };

        if let Some(aggregate) = &aggregate_error {
            for failure in aggregate.failures() {
                self.progress_reporter
                    .report_error(&format!("❌ Updater {}", failure));
            }
        }

        let snapshot = self.render_snapshot()?;
        let sets_exported = snapshot.lines().count();
        let presenter = PresenterFactory::create(PresenterType::for_output(request.output));
        presenter.present(&snapshot)?;

        let failed = report.results().len() - report.successes().count();
        let summary = format!(
            "{} updater(s) succeeded, {} failed, {} operation(s) written, {} set(s) exported",
            report.successes().count(),
            failed,
            report.total_operations(),
            sets_exported
        );
        if failed == 0 {
            self.progress_reporter
                .report_completion(&format!("✅ {}", summary));
        } else {
            self.progress_reporter.report(&format!("⚠️  {}", summary));
        }

        let exit_code = if request.strict && aggregate_error.is_some() {
            ExitCode::UpdatersFailed
        } else {
            ExitCode::Success
        };
        tracing::info!(
            strict = request.strict,
            failed,
            sets = sets_exported,
            exit_code = exit_code.as_i32(),
            "export finished"
        );

        Ok(ExportResponse::new(
            report,
            aggregate_error,
            exit_code,
            sets_exported,
        ))
    }

    /// Renders the whole store in memory before anything is written.
    fn render_snapshot(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.manager
            .store()
            .serialize(&mut buffer)
            .context("Failed to serialize the update store")?;
        String::from_utf8(buffer).context("Serialized snapshot is not valid UTF-8")
    }
}
