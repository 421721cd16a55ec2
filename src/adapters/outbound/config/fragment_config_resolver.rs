use crate::ports::outbound::{ConfigDecoder, ConfigResolver};
use crate::vulnerability_updates::domain::UpdaterName;
use serde_json::Value;
use std::collections::HashMap;

/// FragmentConfigResolver adapter over the `updaters.config` mapping of the
/// loaded configuration file.
///
/// Read-only after construction; shared freely between updater tasks.
#[derive(Debug, Clone, Default)]
pub struct FragmentConfigResolver {
    fragments: HashMap<String, Value>,
}

impl FragmentConfigResolver {
    pub fn new(fragments: HashMap<String, Value>) -> Self {
        Self { fragments }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Names that have a fragment, sorted.
    pub fn configured_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fragments.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ConfigResolver for FragmentConfigResolver {
    fn resolve(&self, name: &UpdaterName) -> ConfigDecoder {
        ConfigDecoder::new(self.fragments.get(name.as_str()).cloned())
    }
}
