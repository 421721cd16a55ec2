mod presenter_factory;
mod updater_registry;

pub use presenter_factory::{PresenterFactory, PresenterType};
pub use updater_registry::{UpdaterContext, UpdaterFactory, UpdaterRegistry};
