use crate::shared::error::UpdateError;
use crate::vulnerability_updates::domain::UpdaterName;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// ConfigResolver port mapping an updater name to its configuration decoder.
///
/// Resolution is a pure lookup over configuration that was loaded once for
/// the run; implementations must not perform I/O.
pub trait ConfigResolver: Send + Sync {
    fn resolve(&self, name: &UpdaterName) -> ConfigDecoder;
}

/// Decoder over one updater's loosely-typed configuration fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDecoder {
    fragment: Option<Value>,
}

impl ConfigDecoder {
    /// A `null` fragment is treated the same as a missing one.
    pub fn new(fragment: Option<Value>) -> Self {
        Self {
            fragment: fragment.filter(|v| !v.is_null()),
        }
    }

    pub fn has_fragment(&self) -> bool {
        self.fragment.is_some()
    }

    /// Populates `target` from the fragment.
    ///
    /// Keys present in the fragment overwrite the matching fields of
    /// `target`; everything else keeps its current value. Without a fragment
    /// `target` is left untouched. On error `target` is not modified.
    pub fn decode_into<T>(&self, target: &mut T) -> Result<(), UpdateError>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(fragment) = &self.fragment else {
            return Ok(());
        };

        let mut merged = serde_json::to_value(&*target)
            .map_err(|e| UpdateError::config(format!("cannot represent defaults: {}", e)))?;
        merge(&mut merged, fragment);

        *target = serde_json::from_value(merged).map_err(|e| UpdateError::config(e.to_string()))?;
        Ok(())
    }

    /// Decodes a fresh `T`, starting from `T::default()`.
    pub fn decode<T>(&self) -> Result<T, UpdateError>
    where
        T: Default + Serialize + DeserializeOwned,
    {
        let mut target = T::default();
        self.decode_into(&mut target)?;
        Ok(target)
    }
}

fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
