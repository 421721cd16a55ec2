use crate::shared::Result;
use serde::{Deserialize, Serialize};

/// Maximum length for updater names (security limit)
const MAX_UPDATER_NAME_LENGTH: usize = 128;

/// NewType wrapper for an updater name.
///
/// The name keys locks, configuration fragments and stored fingerprints, so
/// it is restricted to a small character set that is safe in logs, file
/// names and snapshot lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UpdaterName(String);

impl UpdaterName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            anyhow::bail!("Updater name cannot be empty");
        }

        if name.len() > MAX_UPDATER_NAME_LENGTH {
            anyhow::bail!(
                "Updater name is too long ({} bytes). Maximum allowed: {} bytes",
                name.len(),
                MAX_UPDATER_NAME_LENGTH
            );
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            anyhow::bail!(
                "Updater name '{}' contains invalid characters. Only ASCII alphanumerics, hyphens, underscores and dots are allowed.",
                name
            );
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UpdaterName {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UpdaterName> for String {
    fn from(name: UpdaterName) -> Self {
        name.0
    }
}

impl std::fmt::Display for UpdaterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
