use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
use crate::ports::outbound::OutputPresenter;
use std::path::PathBuf;

/// Presenter type enumeration for factory pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterType {
    Stdout,
    File(PathBuf),
}

impl PresenterType {
    /// Stdout when no output file was given.
    pub fn for_output(output: Option<PathBuf>) -> Self {
        match output {
            Some(path) => PresenterType::File(path),
            None => PresenterType::Stdout,
        }
    }
}

/// Factory selecting where the exported snapshot goes.
pub struct PresenterFactory;

impl PresenterFactory {
    /// # Examples
    /// ```
    /// use updater_export::application::factories::{PresenterFactory, PresenterType};
    ///
    /// let presenter = PresenterFactory::create(PresenterType::Stdout);
    /// ```
    pub fn create(presenter_type: PresenterType) -> Box<dyn OutputPresenter> {
        match presenter_type {
            PresenterType::Stdout => Box::new(StdoutPresenter::new()),
            PresenterType::File(path) => Box::new(FileSystemWriter::new(path)),
        }
    }
}
