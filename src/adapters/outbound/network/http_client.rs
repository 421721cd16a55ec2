use crate::shared::Result;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default `User-Agent` sent by every updater.
pub fn default_user_agent() -> String {
    format!("updater-export/{}", env!("CARGO_PKG_VERSION"))
}

/// Settings for the HTTP client shared by all network updaters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        }
    }
}

/// Builds the one `reqwest::Client` handed to every updater factory, so
/// connection pools are shared across updaters.
pub fn build_http_client(settings: &HttpSettings) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = HttpSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.user_agent.starts_with("updater-export/"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&HttpSettings::default()).is_ok());
    }
}
