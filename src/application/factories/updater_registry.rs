use crate::adapters::outbound::updaters::{
    LocalFeedConfig, LocalFeedUpdater, OsvFeedConfig, OsvFeedUpdater,
};
use crate::ports::outbound::{ConfigDecoder, Updater};
use crate::shared::error::UpdateError;
use crate::vulnerability_updates::domain::UpdaterName;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Everything a factory may use to build one updater instance.
pub struct UpdaterContext<'a> {
    pub name: &'a UpdaterName,
    pub config: &'a ConfigDecoder,
    pub http: &'a reqwest::Client,
    /// Directory relative paths in configuration fragments resolve against.
    pub base_dir: &'a Path,
}

pub type UpdaterFactory =
    Arc<dyn Fn(&UpdaterContext<'_>) -> Result<Box<dyn Updater>, UpdateError> + Send + Sync>;

/// Explicit lookup table from updater name to factory.
///
/// Built once at start-up and handed to the manager; there is no global
/// registration.
#[derive(Clone, Default)]
pub struct UpdaterRegistry {
    factories: BTreeMap<String, UpdaterFactory>,
}

impl UpdaterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `osv` and `local` updaters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("osv", |ctx| {
                let config: OsvFeedConfig = ctx.config.decode()?;
                let updater = OsvFeedUpdater::new(ctx.name.clone(), ctx.http.clone(), config)?;
                Ok(Box::new(updater) as Box<dyn Updater>)
            })
            .register("local", |ctx| {
                let config: LocalFeedConfig = ctx.config.decode()?;
                let updater = LocalFeedUpdater::new(ctx.name.clone(), config, ctx.base_dir)?;
                Ok(Box::new(updater) as Box<dyn Updater>)
            });
        registry
    }

    /// Registers `factory` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&UpdaterContext<'_>) -> Result<Box<dyn Updater>, UpdateError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in lexicographic order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Builds the updater registered under `ctx.name`.
    ///
    /// # Errors
    /// `UpdateError::UnknownUpdater` when nothing is registered under the
    /// name; otherwise whatever the factory reports (usually `Config`).
    pub fn create(&self, ctx: &UpdaterContext<'_>) -> Result<Box<dyn Updater>, UpdateError> {
        let factory = self
            .factories
            .get(ctx.name.as_str())
            .ok_or(UpdateError::UnknownUpdater)?;
        factory(ctx)
    }
}

impl std::fmt::Debug for UpdaterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdaterRegistry")
            .field("names", &self.names())
            .finish()
    }
}
